use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Each,
    If,
    Unless,
}

impl SectionKind {
    pub fn directive_name(&self) -> &'static str {
        match self {
            Self::Each => "each",
            Self::If => "if",
            Self::Unless => "unless",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextKind {
    Index,
    Last,
    This,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TemplateNode {
    Literal {
        text: String,
    },
    Variable {
        path: String,
        raw: bool,
    },
    #[serde(rename_all = "camelCase")]
    Section {
        section: SectionKind,
        path: String,
        body: Vec<TemplateNode>,
        else_body: Option<Vec<TemplateNode>>,
    },
    Repeat {
        path: String,
        body: Vec<TemplateNode>,
    },
    ContextRef {
        context: ContextKind,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GapReason {
    Missing,
    WrongType,
    OutOfRange,
}

impl GapReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::WrongType => "wrong-type",
            Self::OutOfRange => "out-of-range",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gap {
    pub field_path: String,
    pub reason: GapReason,
}

impl Gap {
    pub fn new(field_path: impl Into<String>, reason: GapReason) -> Self {
        Self {
            field_path: field_path.into(),
            reason,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JsonType {
    String,
    Number,
    Boolean,
    Array,
    Object,
    Any,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaNode {
    pub value_type: JsonType,
    pub required: BTreeSet<String>,
    pub enum_values: Option<Vec<Value>>,
    pub default_value: Option<Value>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub children: Vec<(String, SchemaNode)>,
    pub item_schema: Option<Box<SchemaNode>>,
}

impl SchemaNode {
    pub fn new(value_type: JsonType) -> Self {
        Self {
            value_type,
            required: BTreeSet::new(),
            enum_values: None,
            default_value: None,
            min_value: None,
            max_value: None,
            children: Vec::new(),
            item_schema: None,
        }
    }

    pub fn string() -> Self {
        Self::new(JsonType::String)
    }

    pub fn number() -> Self {
        Self::new(JsonType::Number)
    }

    pub fn boolean() -> Self {
        Self::new(JsonType::Boolean)
    }

    pub fn object() -> Self {
        Self::new(JsonType::Object)
    }

    pub fn array(item_schema: SchemaNode) -> Self {
        let mut node = Self::new(JsonType::Array);
        node.item_schema = Some(Box::new(item_schema));
        node
    }

    pub fn any() -> Self {
        Self::new(JsonType::Any)
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn with_enum(mut self, values: Vec<Value>) -> Self {
        self.enum_values = Some(values);
        self
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min_value = Some(min);
        self.max_value = Some(max);
        self
    }

    pub fn child(mut self, name: impl Into<String>, node: SchemaNode) -> Self {
        self.children.push((name.into(), node));
        self
    }

    pub fn required_child(mut self, name: impl Into<String>, node: SchemaNode) -> Self {
        let name = name.into();
        self.required.insert(name.clone());
        self.children.push((name, node));
        self
    }
}
