//! Runs a resolved command group against its database.
//!
//! Parameters are validated and defaulted for every command before any SQL
//! runs, so a bad batch element never leaves a half-applied transaction.
//! Reads go to a pooled reader; mutations run on the writer inside
//! [`transact`].

use std::collections::BTreeMap;

use modelsql_core::errors::{DefinitionError, EngineError, ExecError, ParamError};
use modelsql_core::types::{ParamMap, Record};
use modelsql_params::defaults::DefaultSources;
use modelsql_params::resolve_params;
use modelsql_registry::{Command, CommandGroup, ResolvedGroup};
use modelsql_storage::statement::query_total;
use modelsql_storage::{execute, query, transact, DatabaseManager};
use rusqlite::Connection;
use rustc_hash::FxHashMap;
use serde::Serialize;

/// Result of a paging select.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PagingResult {
    pub total: i64,
    pub data: Vec<Record>,
}

impl PagingResult {
    pub fn is_empty(&self) -> bool {
        self.total == 0 && self.data.is_empty()
    }
}

/// Output tag (or `data<i>`) → records.
pub type MultiResult = BTreeMap<String, Vec<Record>>;

/// Input pin → parameter maps, one per execution.
pub type PinBatches = BTreeMap<String, Vec<ParamMap>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExecOutcome {
    pub rows_affected: usize,
    /// Synthesized defaults flagged `return`.
    pub returned: ParamMap,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchOutcome {
    pub rows_affected: usize,
    /// One map per element that synthesized returnable defaults.
    pub returned: Vec<ParamMap>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchMultiOutcome {
    pub rows_affected: usize,
    pub returned: BTreeMap<String, Vec<ParamMap>>,
}

/// Executes one resolved group. Borrowed for the length of one call.
pub struct Executor<'a> {
    db: &'a DatabaseManager,
    target: &'a ResolvedGroup,
    sources: DefaultSources<'a>,
}

impl<'a> Executor<'a> {
    pub fn new(
        db: &'a DatabaseManager,
        target: &'a ResolvedGroup,
        sources: DefaultSources<'a>,
    ) -> Self {
        Self { db, target, sources }
    }

    /// Plain and nested selects: the first command's rows.
    pub fn select(&self, params: &ParamMap) -> Result<Vec<Record>, EngineError> {
        let command = self.first_command()?;
        let (params, _) = prepare(std::slice::from_ref(command), params, self.sources)?;
        Ok(self.db.with_reader(|conn| query(conn, &command.sql, &params))?)
    }

    /// Count command, then data command, on the same reader.
    pub fn paging_select(&self, params: &ParamMap) -> Result<PagingResult, EngineError> {
        let group = &self.target.group;
        let [count, data] = group.commands.as_slice() else {
            return Err(DefinitionError::PagingCommandCount {
                path: self.path(),
                group: group.id.clone(),
                found: group.commands.len(),
            }
            .into());
        };
        let (params, _) = prepare(&group.commands, params, self.sources)?;
        let result = self.db.with_reader(|conn| {
            let total = query_total(conn, &count.sql, &params)?;
            let data = query(conn, &data.sql, &params)?;
            Ok(PagingResult { total, data })
        })?;
        Ok(result)
    }

    /// Every command on its own, keyed by output tag or `data<i>`.
    pub fn multi_select(&self, params: &ParamMap) -> Result<MultiResult, EngineError> {
        let commands = &self.target.group.commands;
        let (params, _) = prepare(commands, params, self.sources)?;
        let mut result = MultiResult::new();
        for (i, command) in commands.iter().enumerate() {
            let key = command
                .output_tag
                .clone()
                .unwrap_or_else(|| format!("data{i}"));
            let records = self.db.with_reader(|conn| query(conn, &command.sql, &params))?;
            result.insert(key, records);
        }
        Ok(result)
    }

    /// All commands against one parameter map, in one transaction.
    pub fn exec(&self, params: &ParamMap) -> Result<ExecOutcome, EngineError> {
        let commands = &self.target.group.commands;
        let (params, returned) = prepare(commands, params, self.sources)?;
        let rows_affected = self.db.with_writer(|conn| {
            transact(conn, |tx| run_all(tx, commands.iter(), &params))
        })?;
        Ok(ExecOutcome {
            rows_affected,
            returned,
        })
    }

    /// The first command once per batch element. One transaction for the
    /// whole batch, or one per element when the group sets `eachtran`.
    pub fn batch_exec(&self, batch: &[ParamMap]) -> Result<BatchOutcome, EngineError> {
        let group = &self.target.group;
        let command = self.first_command()?;
        if group.commands.len() > 1 {
            tracing::warn!(
                model = %self.target.model_key(),
                group = %group.id,
                ignored = group.commands.len() - 1,
                "batch exec runs only its first command"
            );
        }

        let mut prepared = Vec::with_capacity(batch.len());
        for element in batch {
            prepared.push(prepare(std::slice::from_ref(command), element, self.sources)?);
        }

        let rows_affected = if group.each_transaction {
            let mut total = 0;
            for (index, (params, _)) in prepared.iter().enumerate() {
                let applied = self
                    .db
                    .with_writer(|conn| transact(conn, |tx| execute(tx, &command.sql, params)));
                match applied {
                    Ok(rows) => total += rows,
                    Err(e) => {
                        return Err(partial_failure(index, total, returned_of(&prepared[..index]), e))
                    }
                }
            }
            total
        } else {
            self.db.with_writer(|conn| {
                transact(conn, |tx| {
                    let mut total = 0;
                    for (params, _) in &prepared {
                        total += execute(tx, &command.sql, params)?;
                    }
                    Ok(total)
                })
            })?
        };

        Ok(BatchOutcome {
            rows_affected,
            returned: returned_of(&prepared),
        })
    }

    /// Each command once per element of its input pin's batch.
    ///
    /// Without `eachtran` everything runs in one transaction, command by
    /// command. With it, every element of a pin gets its own transaction
    /// running all commands bound to that pin.
    pub fn batch_multi_exec(
        &self,
        batches: &PinBatches,
    ) -> Result<BatchMultiOutcome, EngineError> {
        let group = &self.target.group;

        let mut pins: Vec<&str> = Vec::new();
        for (index, command) in group.commands.iter().enumerate() {
            let pin = command
                .input_pin
                .as_deref()
                .ok_or_else(|| DefinitionError::MissingInputPin {
                    path: self.path(),
                    group: group.id.clone(),
                    index,
                })?;
            if !pins.contains(&pin) {
                pins.push(pin);
            }
        }
        for pin in &pins {
            if !batches.contains_key(*pin) {
                return Err(ExecError::MissingPin {
                    pin: pin.to_string(),
                }
                .into());
            }
        }

        let mut prepared: FxHashMap<&str, Vec<Prepared>> = FxHashMap::default();
        for pin in &pins {
            let mut pin_prepared = Vec::new();
            for element in batches.get(*pin).into_iter().flatten() {
                let bound = commands_for(&group.commands, pin);
                pin_prepared.push(prepare(bound, element, self.sources)?);
            }
            prepared.insert(pin, pin_prepared);
        }

        let rows_affected = if group.each_transaction {
            let mut total = 0;
            let mut committed: Vec<&Prepared> = Vec::new();
            for pin in &pins {
                for element in prepared.get(pin).into_iter().flatten() {
                    let applied = self.db.with_writer(|conn| {
                        transact(conn, |tx| {
                            run_all(tx, commands_for(&group.commands, pin), &element.0)
                        })
                    });
                    match applied {
                        Ok(rows) => total += rows,
                        Err(e) => {
                            let returned = returned_of(committed.iter().copied());
                            return Err(partial_failure(committed.len(), total, returned, e));
                        }
                    }
                    committed.push(element);
                }
            }
            total
        } else {
            self.db.with_writer(|conn| {
                transact(conn, |tx| {
                    let mut total = 0;
                    for command in &group.commands {
                        let pin = command.input_pin.as_deref().unwrap_or_default();
                        for (params, _) in prepared.get(pin).into_iter().flatten() {
                            total += execute(tx, &command.sql, params)?;
                        }
                    }
                    Ok(total)
                })
            })?
        };

        let mut returned = BTreeMap::new();
        for pin in &pins {
            let pin_returned = returned_of(prepared.get(pin).into_iter().flatten());
            if !pin_returned.is_empty() {
                returned.insert(pin.to_string(), pin_returned);
            }
        }

        Ok(BatchMultiOutcome {
            rows_affected,
            returned,
        })
    }

    fn first_command(&self) -> Result<&'a Command, EngineError> {
        let target: &'a ResolvedGroup = self.target;
        let group: &'a CommandGroup = &target.group;
        group.commands.first().ok_or_else(|| {
            DefinitionError::EmptyGroup {
                path: self.path(),
                group: group.id.clone(),
            }
            .into()
        })
    }

    fn path(&self) -> String {
        self.target.model.path.display().to_string()
    }
}

/// Filled parameters of one element and its returnable defaults.
type Prepared = (ParamMap, ParamMap);

/// Non-empty returnable defaults of `elements`, in order.
fn returned_of<'p>(elements: impl IntoIterator<Item = &'p Prepared>) -> Vec<ParamMap> {
    elements
        .into_iter()
        .filter(|(_, returned)| !returned.is_empty())
        .map(|(_, returned)| returned.clone())
        .collect()
}

/// Error for an `eachtran` element that failed after `committed` elements
/// were applied; the plain cause when nothing was.
fn partial_failure(
    committed: usize,
    rows_affected: usize,
    returned: Vec<ParamMap>,
    cause: ExecError,
) -> EngineError {
    if committed == 0 {
        return cause.into();
    }
    tracing::warn!(committed, rows_affected, error = %cause, "batch failed after partial commit");
    EngineError::PartiallyCommitted {
        committed,
        rows_affected,
        returned,
        source: Box::new(cause.into()),
    }
}

/// Copy `params` and run the validate-or-default pass of each command over
/// the copy, in order. Returns the filled map and the returnable defaults.
fn prepare<'c>(
    commands: impl IntoIterator<Item = &'c Command>,
    params: &ParamMap,
    sources: DefaultSources<'_>,
) -> Result<Prepared, ParamError> {
    let mut params = params.clone();
    let mut returned = ParamMap::new();
    for command in commands {
        returned.extend(resolve_params(&command.params, &mut params, sources)?);
    }
    Ok((params, returned))
}

fn commands_for<'c>(commands: &'c [Command], pin: &'c str) -> impl Iterator<Item = &'c Command> {
    commands
        .iter()
        .filter(move |c| c.input_pin.as_deref() == Some(pin))
}

fn run_all<'c>(
    conn: &Connection,
    commands: impl Iterator<Item = &'c Command>,
    params: &ParamMap,
) -> Result<usize, ExecError> {
    let mut total = 0;
    for command in commands {
        total += execute(conn, &command.sql, params)?;
    }
    Ok(total)
}
