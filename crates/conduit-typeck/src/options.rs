//! Analysis configuration

/// Names under which the builtin classes are declared
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinNames {
    pub any: String,
    pub nothing: String,
    pub boolean: String,
    pub float: String,
    pub int: String,
    pub string: String,
    pub list: String,
    pub map: String,
    /// Optional numeric supertype of Int and Float
    pub number: String,
}

impl Default for BuiltinNames {
    fn default() -> Self {
        Self {
            any: "Any".to_string(),
            nothing: "Nothing".to_string(),
            boolean: "Boolean".to_string(),
            float: "Float".to_string(),
            int: "Int".to_string(),
            string: "String".to_string(),
            list: "List".to_string(),
            map: "Map".to_string(),
            number: "Number".to_string(),
        }
    }
}

/// Options of an [`Analysis`](crate::Analysis)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisOptions {
    pub builtin_names: BuiltinNames,
    /// Maximum nesting of calls the partial evaluator folds through
    pub max_call_depth: usize,
}

impl AnalysisOptions {
    pub const DEFAULT_MAX_CALL_DEPTH: usize = 32;

    pub fn with_builtin_names(mut self, builtin_names: BuiltinNames) -> Self {
        self.builtin_names = builtin_names;
        self
    }

    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.max_call_depth = max_call_depth;
        self
    }
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            builtin_names: BuiltinNames::default(),
            max_call_depth: Self::DEFAULT_MAX_CALL_DEPTH,
        }
    }
}
