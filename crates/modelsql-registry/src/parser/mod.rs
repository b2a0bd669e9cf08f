//! XML definition document parser.
//!
//! Event-driven over `quick-xml`. The document root is `<model>`, holding
//! `<sql>` groups, each holding `<cmd>` elements whose text (plain or CDATA)
//! is the SQL and whose `<parameters>` list the parameter contracts. Group
//! invariants are checked as each group closes; any violation rejects the
//! whole document.

mod attributes;

use std::path::Path;
use std::sync::Arc;

use modelsql_core::config::CacheConfig;
use modelsql_core::errors::DefinitionError;
use modelsql_params::ParamSpec;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use rustc_hash::FxHashMap;

use crate::definition::{extract_placeholders, Command, CommandGroup, Document, GroupType};

struct GroupDraft {
    id: String,
    type_name: String,
    cached: bool,
    cache_minutes: Option<i64>,
    id_field: Option<String>,
    parent_id_field: Option<String>,
    each_transaction: bool,
    commands: Vec<Command>,
}

#[derive(Default)]
struct CommandDraft {
    sql: String,
    input_pin: Option<String>,
    output_tag: Option<String>,
    params: Vec<ParamSpec>,
}

struct DocumentParser<'a> {
    path: String,
    cache: &'a CacheConfig,
    stack: Vec<Vec<u8>>,
    model: Option<Document>,
    group: Option<GroupDraft>,
    command: Option<CommandDraft>,
}

/// Parse one definition document. `cache` supplies the global caching
/// switches baked into read groups.
pub fn parse_document(
    path: &Path,
    content: &str,
    cache: &CacheConfig,
) -> Result<Document, DefinitionError> {
    let mut parser = DocumentParser {
        path: path.display().to_string(),
        cache,
        stack: Vec::new(),
        model: None,
        group: None,
        command: None,
    };
    let mut reader = Reader::from_str(content);

    loop {
        let event = reader.read_event().map_err(|e| {
            parser.malformed(format!("at byte {}: {e}", reader.error_position()))
        })?;
        match event {
            Event::Start(e) => {
                parser.open(&e)?;
                parser.stack.push(e.local_name().as_ref().to_vec());
            }
            Event::Empty(e) => {
                parser.open(&e)?;
                parser.close(e.local_name().as_ref())?;
            }
            Event::End(e) => {
                parser.close(e.local_name().as_ref())?;
                parser.stack.pop();
            }
            Event::Text(e) => {
                if parser.in_command_body() {
                    let text = e.unescape().map_err(|e| parser.malformed(e.to_string()))?;
                    parser.push_sql(&text);
                }
            }
            Event::CData(e) => {
                if parser.in_command_body() {
                    let bytes = e.into_inner();
                    let text = std::str::from_utf8(&bytes)
                        .map_err(|e| parser.malformed(format!("CDATA is not UTF-8: {e}")))?;
                    parser.push_sql(text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    parser
        .model
        .take()
        .ok_or_else(|| parser.malformed("no <model> root element".to_string()))
}

impl DocumentParser<'_> {
    fn parent_is(&self, name: &[u8]) -> bool {
        self.stack.last().is_some_and(|top| top.as_slice() == name)
    }

    fn in_command_body(&self) -> bool {
        self.command.is_some() && self.parent_is(b"cmd")
    }

    fn push_sql(&mut self, text: &str) {
        if let Some(cmd) = self.command.as_mut() {
            cmd.sql.push_str(text);
        }
    }

    fn open(&mut self, element: &BytesStart<'_>) -> Result<(), DefinitionError> {
        let name = element.local_name();
        match name.as_ref() {
            b"model" if self.stack.is_empty() && self.model.is_none() => {
                let attrs = self.attributes(element, None)?;
                self.model = Some(Document {
                    id: attributes::text(&attrs, "id").unwrap_or_default(),
                    database: attributes::text(&attrs, "database"),
                    groups: FxHashMap::default(),
                });
            }
            _ if self.stack.is_empty() => {
                return Err(self.malformed("root element must be <model>".to_string()));
            }
            b"sql" if self.parent_is(b"model") => {
                let attrs = self.attributes(element, None)?;
                let id = attributes::text(&attrs, "id").unwrap_or_default();
                let invalid = |message: String| DefinitionError::InvalidAttribute {
                    path: self.path.clone(),
                    group: id.clone(),
                    message,
                };
                if id.is_empty() {
                    return Err(invalid("<sql> has no id".to_string()));
                }
                // `model/command` keys stay unambiguous only if ids are one segment.
                if id.contains('/') {
                    return Err(invalid("<sql> id must not contain '/'".to_string()));
                }
                self.group = Some(GroupDraft {
                    type_name: attributes::text(&attrs, "type").unwrap_or_default(),
                    cached: attributes::flag(&attrs, "cached").map_err(invalid)?,
                    cache_minutes: attributes::integer(&attrs, "cachetime").map_err(invalid)?,
                    id_field: attributes::text(&attrs, "idfield"),
                    parent_id_field: attributes::text(&attrs, "pidfield"),
                    each_transaction: attributes::flag(&attrs, "eachtran").map_err(invalid)?,
                    commands: Vec::new(),
                    id,
                });
            }
            b"cmd" if self.parent_is(b"sql") && self.group.is_some() => {
                let group = self.group_id();
                let attrs = self.attributes(element, Some(&group))?;
                self.command = Some(CommandDraft {
                    input_pin: attributes::text(&attrs, "in"),
                    output_tag: attributes::text(&attrs, "out"),
                    ..CommandDraft::default()
                });
            }
            b"parameter" if self.command.is_some() => {
                let group = self.group_id();
                let attrs = self.attributes(element, Some(&group))?;
                let spec = attributes::parameter(&attrs).map_err(|message| {
                    DefinitionError::InvalidParameter {
                        path: self.path.clone(),
                        group: group.clone(),
                        parameter: attrs.get("name").cloned().unwrap_or_default(),
                        message,
                    }
                })?;
                if let Some(cmd) = self.command.as_mut() {
                    cmd.params.push(spec);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, name: &[u8]) -> Result<(), DefinitionError> {
        match name {
            b"cmd" => {
                if let (Some(draft), Some(group)) = (self.command.take(), self.group.as_mut()) {
                    let sql = draft.sql.trim().to_string();
                    group.commands.push(Command {
                        placeholders: extract_placeholders(&sql),
                        sql,
                        input_pin: draft.input_pin,
                        output_tag: draft.output_tag,
                        params: draft.params,
                    });
                }
            }
            b"sql" if self.command.is_none() => {
                if let Some(draft) = self.group.take() {
                    let group = self.finish_group(draft)?;
                    let path = self.path.clone();
                    if let Some(model) = self.model.as_mut() {
                        if model.groups.contains_key(&group.id) {
                            return Err(DefinitionError::DuplicateGroup {
                                path,
                                group: group.id,
                            });
                        }
                        model.groups.insert(group.id.clone(), Arc::new(group));
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn finish_group(&self, draft: GroupDraft) -> Result<CommandGroup, DefinitionError> {
        let path = || self.path.clone();
        let group_type =
            GroupType::from_keyword(&draft.type_name).ok_or_else(|| DefinitionError::UnknownGroupType {
                path: path(),
                group: draft.id.clone(),
                type_name: draft.type_name.clone(),
            })?;

        if draft.commands.is_empty() && !group_type.is_reserved() {
            return Err(DefinitionError::EmptyGroup {
                path: path(),
                group: draft.id,
            });
        }
        if group_type == GroupType::PagingSelect && draft.commands.len() != 2 {
            return Err(DefinitionError::PagingCommandCount {
                path: path(),
                group: draft.id,
                found: draft.commands.len(),
            });
        }
        if let Some(minutes) = draft.cache_minutes.filter(|m| *m < -4) {
            return Err(DefinitionError::InvalidAttribute {
                path: path(),
                group: draft.id,
                message: format!("cachetime {minutes} is not minutes or one of -1..=-4"),
            });
        }

        for (index, command) in draft.commands.iter().enumerate() {
            if command.sql.is_empty() {
                return Err(DefinitionError::InvalidAttribute {
                    path: path(),
                    group: draft.id,
                    message: format!("command #{index} has no SQL"),
                });
            }
            if group_type == GroupType::BatchMultiExec && command.input_pin.is_none() {
                return Err(DefinitionError::MissingInputPin {
                    path: path(),
                    group: draft.id,
                    index,
                });
            }
            if let Some(unbound) = command
                .params
                .iter()
                .find(|p| !command.placeholders.contains(&p.name))
            {
                return Err(DefinitionError::UnboundParameter {
                    path: path(),
                    group: draft.id,
                    parameter: unbound.name.clone(),
                });
            }
        }

        let cached = draft.cached && self.cache.enabled && group_type.is_read();
        let cache_minutes = match draft.cache_minutes {
            Some(m) if m != 0 => m,
            _ if cached => self.cache.default_minutes,
            _ => 0,
        };

        Ok(CommandGroup {
            id: draft.id,
            group_type,
            id_field: draft.id_field,
            parent_id_field: draft.parent_id_field,
            commands: draft.commands,
            cached,
            cache_minutes,
            each_transaction: draft.each_transaction && group_type.is_batch(),
        })
    }

    fn group_id(&self) -> String {
        self.group.as_ref().map(|g| g.id.clone()).unwrap_or_default()
    }

    fn attributes(
        &self,
        element: &BytesStart<'_>,
        group: Option<&str>,
    ) -> Result<FxHashMap<String, String>, DefinitionError> {
        attributes::attribute_map(element).map_err(|message| match group {
            Some(group) => DefinitionError::InvalidAttribute {
                path: self.path.clone(),
                group: group.to_string(),
                message,
            },
            None => self.malformed(message),
        })
    }

    fn malformed(&self, message: String) -> DefinitionError {
        DefinitionError::Malformed {
            path: self.path.clone(),
            message,
        }
    }
}
