use std::collections::{BTreeMap, HashMap};

/// Placeholder category code for items whose category is unknown.
pub const CATEGORY_DEFAULT: &str = "XXX";

/// Table of part category codes (`ASM`, `PCB`, ...) and their display names.
#[derive(Debug, Clone, Default)]
pub struct Categories {
    by_code: BTreeMap<String, String>,
    code_by_name: HashMap<String, String>,
    code_by_lower_code: HashMap<String, String>,
    code_by_lower_name: HashMap<String, String>,
}

impl Categories {
    /// Build from `(code, name)` pairs.
    pub fn new<I, C, N>(entries: I) -> Self
    where
        I: IntoIterator<Item = (C, N)>,
        C: Into<String>,
        N: Into<String>,
    {
        let mut table = Self::default();
        for (code, name) in entries {
            let code = code.into();
            let name = name.into();
            table.code_by_name.insert(name.clone(), code.clone());
            table
                .code_by_lower_name
                .insert(name.to_lowercase(), code.clone());
            table
                .code_by_lower_code
                .insert(code.to_lowercase(), code.clone());
            table.by_code.insert(code, name);
        }
        table
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }

    pub fn contains_code(&self, code: &str) -> bool {
        self.by_code.contains_key(code)
    }

    /// Display name for a category code.
    pub fn name_for(&self, code: &str) -> Option<&str> {
        self.by_code.get(code).map(String::as_str)
    }

    /// Category code for an exact display name.
    pub fn code_for(&self, name: &str) -> Option<&str> {
        self.code_by_name.get(name).map(String::as_str)
    }

    /// Convert a raw category cell to a code.
    ///
    /// Known display names become their code, other text passes through and
    /// an empty cell becomes [`CATEGORY_DEFAULT`].
    pub fn convert(&self, raw: &str) -> String {
        if raw.is_empty() {
            return CATEGORY_DEFAULT.to_string();
        }
        self.code_for(raw).unwrap_or(raw).to_string()
    }

    /// Resolve a user-supplied category (name or code, any case) to its code.
    ///
    /// Returns `None` when the category is not in the table.
    pub fn normalize(&self, raw: &str) -> Option<String> {
        let lowered = raw.trim().to_lowercase();
        self.code_by_lower_name
            .get(&lowered)
            .or_else(|| self.code_by_lower_code.get(&lowered))
            .cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.by_code.iter().map(|(c, n)| (c.as_str(), n.as_str()))
    }
}
