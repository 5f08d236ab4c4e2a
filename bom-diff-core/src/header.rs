//! Column header resolution.
//!
//! A [`HeaderFilter`] binds one canonical attribute name to the raw column
//! headers that may carry it, plus the parser that turns the cell text into a
//! [`Value`]. A [`FilterSet`] is an ordered registry of filters: resolution
//! tries every filter in registration order and the first acceptor wins.

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use serde::Deserialize;
use tracing::warn;

use crate::category::Categories;
use crate::error::SchemaError;
use crate::value::Value;

/// Placeholder part number for items whose number is unknown.
pub const PART_NUMBER_DEFAULT: &str = "XXXXXX";

/// Predicate used by [`Matcher::Predicate`].
pub type HeaderPredicate = fn(&str) -> bool;

/// One way a raw header may be accepted by a filter.
#[derive(Clone)]
pub enum Matcher {
    /// Case-insensitive exact header text.
    Exact(String),
    /// Arbitrary header test, named for diagnostics and config round-trips.
    Predicate {
        name: &'static str,
        test: HeaderPredicate,
    },
}

impl Matcher {
    pub fn exact(header: impl Into<String>) -> Self {
        Matcher::Exact(header.into())
    }

    /// Whether this matcher accepts the raw header text.
    pub fn accepts(&self, header: &str) -> bool {
        match self {
            Matcher::Exact(expected) => header.to_lowercase() == expected.to_lowercase(),
            Matcher::Predicate { test, .. } => test(header),
        }
    }

    /// Look up a built-in predicate by its config name (`__is_qty__`, ...).
    pub fn predicate(name: &str) -> Option<Self> {
        let (name, test): (&'static str, HeaderPredicate) = match name {
            "__is_qty__" => ("__is_qty__", is_quantity_header),
            "__is_revision__" => ("__is_revision__", is_revision_header),
            "__is_part_number__" | "__is_propel_number__" => {
                ("__is_part_number__", is_part_number_header)
            }
            _ => return None,
        };
        Some(Matcher::Predicate { name, test })
    }
}

impl Debug for Matcher {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Exact(header) => f.debug_tuple("Exact").field(header).finish(),
            Matcher::Predicate { name, .. } => f.debug_tuple("Predicate").field(name).finish(),
        }
    }
}

fn is_quantity_header(header: &str) -> bool {
    header.contains("qty") || header.contains("quantity")
}

fn is_revision_header(header: &str) -> bool {
    !header.is_empty() && header.chars().all(|c| c.is_ascii_digit())
}

fn is_part_number_header(header: &str) -> bool {
    !header.trim().is_empty()
}

/// Cell parser applied to every value an attribute receives.
#[derive(Debug, Clone)]
pub enum ValueParser {
    /// Keep the cleaned text.
    Text,
    /// Signed integer; anything else is a parse error.
    Int,
    /// Floating point; anything else is a parse error.
    Float,
    /// Category display name to category code.
    Category(Arc<Categories>),
    /// Integer rendered back as text, or the part-number placeholder.
    StrInt,
    /// Numeric revisions become two-digit zero-padded text.
    Revision,
    /// `TRUE`/`FALSE` in any case; other text is empty.
    Bool,
    /// Integer rendered back as text, other text kept as is.
    CodeOrNumber,
    /// Leading digits as an integer; text without leading digits is kept.
    Quantity,
    /// Assembly level number, tolerating a `"2,..."` suffix.
    Level,
    /// Dotted tree position.
    TreeNumber,
}

impl ValueParser {
    /// Resolve a config parser name. Unknown names yield `None`.
    pub fn from_name(name: &str, categories: &Arc<Categories>) -> Option<Self> {
        let parser = match name {
            "" | "str" => ValueParser::Text,
            "int" => ValueParser::Int,
            "float" => ValueParser::Float,
            "convert_cat" | "category" => ValueParser::Category(Arc::clone(categories)),
            "str_int" => ValueParser::StrInt,
            "convert_rev" | "revision" => ValueParser::Revision,
            "convert_bool" | "bool" => ValueParser::Bool,
            "code_or_number" => ValueParser::CodeOrNumber,
            "convert_qty" | "quantity" => ValueParser::Quantity,
            "convert_level" | "level" => ValueParser::Level,
            "tree_number" | "remove_newlines" => ValueParser::TreeNumber,
            _ => return None,
        };
        Some(parser)
    }

    /// Parse a cleaned cell.
    pub fn parse(&self, raw: &str) -> Result<Value, String> {
        match self {
            ValueParser::Text | ValueParser::TreeNumber => Ok(Value::text(raw)),
            ValueParser::Int => raw
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|e| format!("invalid integer '{raw}': {e}")),
            ValueParser::Float => raw
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| format!("invalid number '{raw}': {e}")),
            ValueParser::Category(categories) => Ok(Value::Text(categories.convert(raw))),
            ValueParser::StrInt => Ok(Value::Text(match raw.parse::<i64>() {
                Ok(n) => n.to_string(),
                Err(_) => PART_NUMBER_DEFAULT.to_string(),
            })),
            ValueParser::Revision => Ok(Value::Text(match raw.parse::<i64>() {
                Ok(n) => format!("{n:02}"),
                Err(_) => raw.to_string(),
            })),
            ValueParser::Bool => Ok(match raw.to_uppercase().as_str() {
                "TRUE" => Value::Bool(true),
                "FALSE" => Value::Bool(false),
                _ => Value::Empty,
            }),
            ValueParser::CodeOrNumber => Ok(Value::Text(match raw.parse::<i64>() {
                Ok(n) => n.to_string(),
                Err(_) => raw.to_string(),
            })),
            ValueParser::Quantity => {
                let digits: String = raw.chars().take_while(char::is_ascii_digit).collect();
                Ok(match digits.parse::<i64>() {
                    Ok(n) => Value::Int(n),
                    Err(_) => Value::text(raw),
                })
            }
            ValueParser::Level => parse_level(raw),
        }
    }
}

fn parse_level(raw: &str) -> Result<Value, String> {
    if let Some((head, _)) = raw.split_once(',') {
        return head
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|e| format!("invalid level '{raw}': {e}"));
    }
    Ok(raw.parse::<i64>().map(Value::Int).unwrap_or(Value::Empty))
}

/// Trim a raw cell and drop embedded newlines.
pub fn clean_cell(raw: &str) -> String {
    raw.replace(['\n', '\r'], "").trim().to_string()
}

/// Maps raw column headers to one canonical attribute.
#[derive(Debug, Clone)]
pub struct HeaderFilter {
    attribute: String,
    matchers: Vec<Matcher>,
    parser: ValueParser,
    critical: bool,
    aliases: Vec<String>,
}

impl HeaderFilter {
    pub fn new(attribute: impl Into<String>, parser: ValueParser) -> Self {
        Self {
            attribute: attribute.into(),
            matchers: Vec::new(),
            parser,
            critical: false,
            aliases: Vec::new(),
        }
    }

    /// Accept these exact (case-insensitive) header texts.
    pub fn with_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.matchers
            .extend(headers.into_iter().map(|h| Matcher::Exact(h.into())));
        self
    }

    pub fn with_matcher(mut self, matcher: Matcher) -> Self {
        self.matchers.push(matcher);
        self
    }

    pub fn critical(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }

    /// Declare other filters whose columns also satisfy this attribute.
    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn parser(&self) -> &ValueParser {
        &self.parser
    }

    pub fn is_critical(&self) -> bool {
        self.critical
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn matchers(&self) -> &[Matcher] {
        &self.matchers
    }

    /// Whether a raw header (or the attribute name itself) selects this filter.
    pub fn accepts(&self, header: &str) -> bool {
        header == self.attribute || self.matchers.iter().any(|m| m.accepts(header))
    }

    /// Same attribute, or `other` is one of this filter's declared aliases.
    ///
    /// Not symmetric: aliases are declared on one side only.
    pub fn is_equivalent(&self, other: &HeaderFilter) -> bool {
        self.attribute == other.attribute || self.aliases.iter().any(|a| *a == other.attribute)
    }
}

/// Ordered registry of header filters.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    filters: Vec<Arc<HeaderFilter>>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a filter after the existing ones.
    pub fn push(&mut self, filter: HeaderFilter) {
        self.filters.push(Arc::new(filter));
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HeaderFilter> {
        self.filters.iter().map(AsRef::as_ref)
    }

    /// First filter, in registration order, that accepts `header`.
    pub fn resolve(&self, header: &str) -> Option<&HeaderFilter> {
        self.iter().find(|f| f.accepts(header))
    }

    /// Filter registered for exactly this attribute name.
    pub fn get(&self, attribute: &str) -> Option<&HeaderFilter> {
        self.iter().find(|f| f.attribute == attribute)
    }

    /// Canonical attribute names in registration order.
    pub fn attribute_names(&self) -> Vec<String> {
        self.iter().map(|f| f.attribute.clone()).collect()
    }

    /// Subset of filters by attribute name, in the order requested.
    ///
    /// Names without a registered filter are skipped.
    pub fn select<I, S>(&self, names: I) -> FilterSet
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let filters = names
            .into_iter()
            .filter_map(|name| {
                self.filters
                    .iter()
                    .find(|f| f.attribute == name.as_ref())
                    .cloned()
            })
            .collect();
        FilterSet { filters }
    }

    /// Build a registry from declarative filter specs, preserving their order.
    pub fn from_specs(
        specs: &[FilterSpec],
        categories: &Arc<Categories>,
    ) -> Result<FilterSet, SchemaError> {
        let known: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
        let mut set = FilterSet::new();
        for spec in specs {
            for alias in &spec.equivalent_to {
                if !known.contains(&alias.as_str()) {
                    return Err(SchemaError::UnknownAlias {
                        filter: spec.name.clone(),
                        alias: alias.clone(),
                    });
                }
            }
            set.push(spec.build(categories));
        }
        Ok(set)
    }
}

/// Declarative description of a [`HeaderFilter`], as found in settings files.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FilterSpec {
    pub name: String,
    #[serde(default)]
    pub filters: Vec<String>,
    #[serde(default, rename = "type")]
    pub parser: String,
    #[serde(default)]
    pub is_critical: bool,
    #[serde(default)]
    pub equivalent_to: Vec<String>,
}

impl FilterSpec {
    /// Build the filter. Unknown parser names fall back to plain text.
    pub fn build(&self, categories: &Arc<Categories>) -> HeaderFilter {
        let parser = ValueParser::from_name(&self.parser, categories).unwrap_or_else(|| {
            warn!(
                filter = %self.name,
                parser = %self.parser,
                "unknown value parser, using plain text"
            );
            ValueParser::Text
        });
        let mut filter = HeaderFilter::new(self.name.clone(), parser)
            .critical(self.is_critical)
            .with_aliases(self.equivalent_to.iter().cloned());
        for raw in &self.filters {
            let matcher = Matcher::predicate(raw).unwrap_or_else(|| Matcher::exact(raw.clone()));
            filter = filter.with_matcher(matcher);
        }
        filter
    }
}
