use modelsql_params::ParamSpec;

/// Execution shape of a command group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupType {
    Select,
    PagingSelect,
    NestedSelect,
    MultiSelect,
    Exec,
    BatchExec,
    BatchMultiExec,
    Import,
    Export,
    Report,
}

impl GroupType {
    /// Parse a `type` attribute, including the exec and batch aliases.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let group_type = match keyword.trim().to_ascii_lowercase().as_str() {
            "select" => Self::Select,
            "pagingselect" => Self::PagingSelect,
            "nestedselect" => Self::NestedSelect,
            "multiselect" => Self::MultiSelect,
            "exec" | "insert" | "update" | "delete" => Self::Exec,
            "batchexec" | "batchinsert" | "batchupdate" | "batchdelete" => Self::BatchExec,
            "batchmultiexec" | "batchcomplex" => Self::BatchMultiExec,
            "import" => Self::Import,
            "export" => Self::Export,
            "report" => Self::Report,
            _ => return None,
        };
        Some(group_type)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::PagingSelect => "pagingselect",
            Self::NestedSelect => "nestedselect",
            Self::MultiSelect => "multiselect",
            Self::Exec => "exec",
            Self::BatchExec => "batchexec",
            Self::BatchMultiExec => "batchmultiexec",
            Self::Import => "import",
            Self::Export => "export",
            Self::Report => "report",
        }
    }

    /// Read groups are the only cacheable ones.
    pub fn is_read(&self) -> bool {
        matches!(
            self,
            Self::Select | Self::PagingSelect | Self::NestedSelect | Self::MultiSelect
        )
    }

    /// Parsed but never executed.
    pub fn is_reserved(&self) -> bool {
        matches!(self, Self::Import | Self::Export | Self::Report)
    }

    pub fn is_batch(&self) -> bool {
        matches!(self, Self::BatchExec | Self::BatchMultiExec)
    }
}

/// One `<sql>` element.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandGroup {
    pub id: String,
    pub group_type: GroupType,
    /// Tree assembly fields of nested selects, carried as metadata.
    pub id_field: Option<String>,
    pub parent_id_field: Option<String>,
    pub commands: Vec<Command>,
    /// Effective flag: the group asked for caching, it is a read group and
    /// caching is enabled globally.
    pub cached: bool,
    /// Effective duration code (minutes, or -1..=-4).
    pub cache_minutes: i64,
    /// Batch groups only: one transaction per batch element.
    pub each_transaction: bool,
}

impl CommandGroup {
    /// Every parameter contract of every command, in declaration order.
    pub fn params(&self) -> impl Iterator<Item = &ParamSpec> {
        self.commands.iter().flat_map(|c| c.params.iter())
    }
}

/// One `<cmd>` element.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub sql: String,
    /// `in` attribute: batch key of a batch-multi-exec command.
    pub input_pin: Option<String>,
    /// `out` attribute: result key of a multi-select command.
    pub output_tag: Option<String>,
    pub params: Vec<ParamSpec>,
    /// Named placeholders found in `sql`, without prefix, first occurrence order.
    pub placeholders: Vec<String>,
}
