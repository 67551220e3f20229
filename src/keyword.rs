//! The closed set of workflow keywords and where each may appear.

use std::fmt;

/// A recognized workflow keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    // Blocks
    Rule,
    Checkpoint,
    Subworkflow,
    Module,
    // Top level
    Configfile,
    Include,
    Workdir,
    Localrules,
    Ruleorder,
    WildcardConstraints,
    Envvars,
    Pepfile,
    Pepschema,
    Report,
    Container,
    Containerized,
    Conda,
    Singularity,
    Scattergather,
    ResourceScopes,
    Onstart,
    Onsuccess,
    Onerror,
    // Rule directives
    Input,
    Output,
    Params,
    Threads,
    Resources,
    Priority,
    Version,
    Log,
    Message,
    Benchmark,
    Envmodules,
    Shadow,
    Group,
    Cache,
    Name,
    Handover,
    DefaultTarget,
    Localrule,
    Retries,
    Shell,
    Script,
    Notebook,
    Wrapper,
    Cwl,
    TemplateEngine,
    Run,
    // Subworkflow and module directives
    Snakefile,
    Config,
    SkipValidation,
    MetaWrapper,
    ReplacePrefix,
    Prefix,
}

/// Where a keyword line appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    TopLevel,
    Rule,
    Subworkflow,
    Module,
}

impl Context {
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::TopLevel => "top level",
            Self::Rule => "rule body",
            Self::Subworkflow => "subworkflow body",
            Self::Module => "module body",
        }
    }
}

/// What follows a keyword header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Nested directives, e.g. `rule`.
    Block(Context),
    /// A comma-separated parameter list, e.g. `input`.
    Parameters,
    /// Embedded Python statements, e.g. `run`.
    Code,
}

const KEYWORDS: &[(&str, Keyword)] = &[
    ("rule", Keyword::Rule),
    ("checkpoint", Keyword::Checkpoint),
    ("subworkflow", Keyword::Subworkflow),
    ("module", Keyword::Module),
    ("configfile", Keyword::Configfile),
    ("include", Keyword::Include),
    ("workdir", Keyword::Workdir),
    ("localrules", Keyword::Localrules),
    ("ruleorder", Keyword::Ruleorder),
    ("wildcard_constraints", Keyword::WildcardConstraints),
    ("envvars", Keyword::Envvars),
    ("pepfile", Keyword::Pepfile),
    ("pepschema", Keyword::Pepschema),
    ("report", Keyword::Report),
    ("container", Keyword::Container),
    ("containerized", Keyword::Containerized),
    ("conda", Keyword::Conda),
    ("singularity", Keyword::Singularity),
    ("scattergather", Keyword::Scattergather),
    ("resource_scopes", Keyword::ResourceScopes),
    ("onstart", Keyword::Onstart),
    ("onsuccess", Keyword::Onsuccess),
    ("onerror", Keyword::Onerror),
    ("input", Keyword::Input),
    ("output", Keyword::Output),
    ("params", Keyword::Params),
    ("threads", Keyword::Threads),
    ("resources", Keyword::Resources),
    ("priority", Keyword::Priority),
    ("version", Keyword::Version),
    ("log", Keyword::Log),
    ("message", Keyword::Message),
    ("benchmark", Keyword::Benchmark),
    ("envmodules", Keyword::Envmodules),
    ("shadow", Keyword::Shadow),
    ("group", Keyword::Group),
    ("cache", Keyword::Cache),
    ("name", Keyword::Name),
    ("handover", Keyword::Handover),
    ("default_target", Keyword::DefaultTarget),
    ("localrule", Keyword::Localrule),
    ("retries", Keyword::Retries),
    ("shell", Keyword::Shell),
    ("script", Keyword::Script),
    ("notebook", Keyword::Notebook),
    ("wrapper", Keyword::Wrapper),
    ("cwl", Keyword::Cwl),
    ("template_engine", Keyword::TemplateEngine),
    ("run", Keyword::Run),
    ("snakefile", Keyword::Snakefile),
    ("config", Keyword::Config),
    ("skip_validation", Keyword::SkipValidation),
    ("meta_wrapper", Keyword::MetaWrapper),
    ("replace_prefix", Keyword::ReplacePrefix),
    ("prefix", Keyword::Prefix),
];

impl Keyword {
    /// Look up the keyword spelled exactly `text`.
    #[must_use]
    pub fn from_text(text: &str) -> Option<Self> {
        KEYWORDS
            .iter()
            .find(|(spelling, _)| *spelling == text)
            .map(|(_, keyword)| *keyword)
    }

    /// Canonical spelling.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        KEYWORDS
            .iter()
            .find(|(_, keyword)| *keyword == self)
            .map_or("", |(spelling, _)| spelling)
    }

    #[must_use]
    pub const fn body(self) -> BodyKind {
        match self {
            Self::Rule | Self::Checkpoint => BodyKind::Block(Context::Rule),
            Self::Subworkflow => BodyKind::Block(Context::Subworkflow),
            Self::Module => BodyKind::Block(Context::Module),
            Self::Run | Self::Onstart | Self::Onsuccess | Self::Onerror => BodyKind::Code,
            _ => BodyKind::Parameters,
        }
    }

    /// Block keywords take an optional name after the keyword.
    #[must_use]
    pub const fn is_block(self) -> bool {
        matches!(self.body(), BodyKind::Block(_))
    }

    /// Whether this keyword may head a line in `context`.
    #[must_use]
    pub const fn allowed_in(self, context: Context) -> bool {
        match context {
            Context::TopLevel => matches!(
                self,
                Self::Rule
                    | Self::Checkpoint
                    | Self::Subworkflow
                    | Self::Module
                    | Self::Configfile
                    | Self::Include
                    | Self::Workdir
                    | Self::Localrules
                    | Self::Ruleorder
                    | Self::WildcardConstraints
                    | Self::Envvars
                    | Self::Pepfile
                    | Self::Pepschema
                    | Self::Report
                    | Self::Container
                    | Self::Containerized
                    | Self::Conda
                    | Self::Singularity
                    | Self::Scattergather
                    | Self::ResourceScopes
                    | Self::Onstart
                    | Self::Onsuccess
                    | Self::Onerror
            ),
            Context::Rule => matches!(
                self,
                Self::Input
                    | Self::Output
                    | Self::Params
                    | Self::Threads
                    | Self::Resources
                    | Self::Priority
                    | Self::Version
                    | Self::Log
                    | Self::Message
                    | Self::Benchmark
                    | Self::Conda
                    | Self::Container
                    | Self::Containerized
                    | Self::Singularity
                    | Self::Envmodules
                    | Self::Shadow
                    | Self::Group
                    | Self::Cache
                    | Self::Name
                    | Self::Handover
                    | Self::DefaultTarget
                    | Self::Localrule
                    | Self::Retries
                    | Self::WildcardConstraints
                    | Self::Shell
                    | Self::Script
                    | Self::Notebook
                    | Self::Wrapper
                    | Self::Cwl
                    | Self::TemplateEngine
                    | Self::Run
            ),
            Context::Subworkflow => {
                matches!(self, Self::Workdir | Self::Snakefile | Self::Configfile)
            }
            Context::Module => matches!(
                self,
                Self::Snakefile
                    | Self::Config
                    | Self::SkipValidation
                    | Self::MetaWrapper
                    | Self::ReplacePrefix
                    | Self::Prefix
            ),
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
