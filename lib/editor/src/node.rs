//! Workflow node types and configurations.
//!
//! Nodes are the building blocks of a workflow description. Each node has:
//! - A unique ID within the workflow
//! - A type-specific parameter payload (`NodeParams`)
//! - Declared input and output arguments
//! - Plain downstream pointers, or per-branch pointers embedded in the
//!   branch entries of branching node types
//!
//! Branch-specific next-pointer storage is intentionally modelled as a
//! tagged union here; the synchronizer is the only component that projects
//! it to and from the uniform edge list.

use flowdeck_core::{BranchId, NodeId, WorkflowId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The closed vocabulary of argument value types.
///
/// Array variants keep the flat `Array_*` wire spelling used by the
/// persistence layer rather than nesting an element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    File,
    #[serde(rename = "Array_String")]
    ArrayString,
    #[serde(rename = "Array_Integer")]
    ArrayInteger,
    #[serde(rename = "Array_Number")]
    ArrayNumber,
    #[serde(rename = "Array_Boolean")]
    ArrayBoolean,
    #[serde(rename = "Array_Object")]
    ArrayObject,
    #[serde(rename = "Array_File")]
    ArrayFile,
}

impl DataType {
    /// Returns true for `Array_*` types.
    #[must_use]
    pub const fn is_array(self) -> bool {
        self.element_type().is_some()
    }

    /// Returns the element type of an array type, `None` for scalars.
    #[must_use]
    pub const fn element_type(self) -> Option<DataType> {
        match self {
            Self::ArrayString => Some(Self::String),
            Self::ArrayInteger => Some(Self::Integer),
            Self::ArrayNumber => Some(Self::Number),
            Self::ArrayBoolean => Some(Self::Boolean),
            Self::ArrayObject => Some(Self::Object),
            Self::ArrayFile => Some(Self::File),
            _ => None,
        }
    }

    /// Lifts a type to its array form. Array types are returned unchanged.
    #[must_use]
    pub const fn array_of(base: DataType) -> DataType {
        match base {
            Self::String => Self::ArrayString,
            Self::Integer => Self::ArrayInteger,
            Self::Number => Self::ArrayNumber,
            Self::Boolean => Self::ArrayBoolean,
            Self::Object => Self::ArrayObject,
            Self::File => Self::ArrayFile,
            other => other,
        }
    }
}

/// How an input argument obtains its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Binding {
    /// A literal value entered in the inspector.
    Literal { value: String },
    /// A reference key pointing at an upstream node output,
    /// `"{node}.{arg}[.{sub}...]"`.
    Reference { key: String },
}

impl Binding {
    /// Convenience constructor for a literal binding.
    #[must_use]
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
        }
    }

    /// Convenience constructor for a reference binding.
    #[must_use]
    pub fn reference(key: impl Into<String>) -> Self {
        Self::Reference { key: key.into() }
    }

    /// Returns the reference key, if this binding is a reference.
    #[must_use]
    pub fn as_reference(&self) -> Option<&str> {
        match self {
            Self::Reference { key } => Some(key),
            Self::Literal { .. } => None,
        }
    }

    /// Returns true when the bound value or key is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Literal { value } => value.is_empty(),
            Self::Reference { key } => key.is_empty(),
        }
    }
}

/// A declared input or output argument of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub data_type: DataType,
    #[serde(default)]
    pub required: bool,
    /// Injected by the engine rather than declared by the user.
    #[serde(default)]
    pub system_variable: bool,
    #[serde(default)]
    pub binding: Option<Binding>,
    /// Declared sub-fields for object/array types, recursively.
    #[serde(default)]
    pub sub_args: Vec<ArgSpec>,
}

impl ArgSpec {
    /// Creates an optional argument.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            description: None,
            data_type,
            required: false,
            system_variable: false,
            binding: None,
            sub_args: Vec::new(),
        }
    }

    /// Creates a required argument.
    #[must_use]
    pub fn required(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            required: true,
            ..Self::new(name, data_type)
        }
    }

    /// Creates a system-provided argument.
    #[must_use]
    pub fn system(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            system_variable: true,
            ..Self::new(name, data_type)
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the binding.
    #[must_use]
    pub fn with_binding(mut self, binding: Binding) -> Self {
        self.binding = Some(binding);
        self
    }

    /// Sets the declared sub-fields.
    #[must_use]
    pub fn with_sub_args(mut self, sub_args: Vec<ArgSpec>) -> Self {
        self.sub_args = sub_args;
        self
    }
}

/// Position of a branch within a condition node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BranchKind {
    If,
    ElseIf,
    Else,
}

/// Comparison operators available in condition branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompareOp {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Contains,
    NotContains,
    MatchRegex,
    IsNull,
    NotNull,
}

impl CompareOp {
    /// Null checks take no right-hand operand.
    #[must_use]
    pub const fn is_unary(self) -> bool {
        matches!(self, Self::IsNull | Self::NotNull)
    }
}

/// A single comparison within a condition branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    pub left: Binding,
    pub op: CompareOp,
    #[serde(default)]
    pub right: Option<Binding>,
}

/// One branch of a condition node. Carries its own downstream pointers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionBranch {
    pub uuid: BranchId,
    pub kind: BranchKind,
    #[serde(default)]
    pub conditions: Vec<Comparison>,
    #[serde(default)]
    pub next_node_ids: Vec<NodeId>,
}

impl ConditionBranch {
    /// Creates an empty branch of the given kind with a fresh uuid.
    #[must_use]
    pub fn new(kind: BranchKind) -> Self {
        Self {
            uuid: BranchId::new(),
            kind,
            conditions: Vec::new(),
            next_node_ids: Vec::new(),
        }
    }
}

/// One recognized intent of an intent-recognition node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentRoute {
    pub uuid: BranchId,
    pub intent: String,
    #[serde(default)]
    pub next_node_ids: Vec<NodeId>,
}

impl IntentRoute {
    #[must_use]
    pub fn new(intent: impl Into<String>) -> Self {
        Self {
            uuid: BranchId::new(),
            intent: intent.into(),
            next_node_ids: Vec::new(),
        }
    }
}

/// One selectable option of a QA node in select-answer mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaOption {
    pub uuid: BranchId,
    pub content: String,
    #[serde(default)]
    pub next_node_ids: Vec<NodeId>,
}

impl QaOption {
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            uuid: BranchId::new(),
            content: content.into(),
            next_node_ids: Vec::new(),
        }
    }
}

/// How a QA node expects its answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnswerType {
    Text,
    Select,
}

/// Whether a variable node writes or reads process state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VariableMode {
    SetVariable,
    GetVariable,
}

/// What an End node returns to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReturnType {
    Variable,
    Text,
}

/// Language of a code node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodeLanguage {
    Python,
    JavaScript,
}

/// Iteration mode of a loop node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoopMode {
    Count,
    Array,
    Infinite,
}

/// Text-processing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TextOp {
    Concat,
    Split,
}

/// HTTP request method of an HTTP node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

/// What to do when a node execution fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "on_failure", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExceptionStrategy {
    /// Abort the run.
    Interrupt,
    /// Substitute a fixed output.
    SpecificContent { content: String },
    /// Continue along a dedicated exception flow.
    ExceptionFlow {
        #[serde(default)]
        next_node_ids: Vec<NodeId>,
    },
}

/// Failure-handling configuration for exception-capable node kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionConfig {
    pub timeout_secs: u32,
    pub retry_count: u32,
    pub strategy: ExceptionStrategy,
}

impl Default for ExceptionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 180,
            retry_count: 0,
            strategy: ExceptionStrategy::Interrupt,
        }
    }
}

impl ExceptionConfig {
    /// Downstream targets of the exception flow, empty for other strategies.
    #[must_use]
    pub fn flow_targets(&self) -> &[NodeId] {
        match &self.strategy {
            ExceptionStrategy::ExceptionFlow { next_node_ids } => next_node_ids,
            _ => &[],
        }
    }

    /// Adds a target to the exception flow, switching the strategy if needed.
    pub fn add_flow_target(&mut self, target: NodeId) {
        match &mut self.strategy {
            ExceptionStrategy::ExceptionFlow { next_node_ids } => {
                if !next_node_ids.contains(&target) {
                    next_node_ids.push(target);
                }
            }
            _ => {
                self.strategy = ExceptionStrategy::ExceptionFlow {
                    next_node_ids: vec![target],
                };
            }
        }
    }

    /// Removes a target from the exception flow, if present.
    pub fn remove_flow_target(&mut self, target: NodeId) {
        if let ExceptionStrategy::ExceptionFlow { next_node_ids } = &mut self.strategy {
            next_node_ids.retain(|&id| id != target);
        }
    }

    /// Replaces the exception-flow target list.
    pub(crate) fn set_flow_targets(&mut self, targets: Vec<NodeId>) {
        self.strategy = ExceptionStrategy::ExceptionFlow {
            next_node_ids: targets,
        };
    }
}

/// Type-specific parameter payload, one variant per node type.
///
/// Branching variants (`Condition`, `IntentRecognition`, select-mode `Qa`)
/// embed their downstream pointers inside each branch entry instead of using
/// the node-level `next_node_ids`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeParams {
    Start,
    End {
        return_type: Option<ReturnType>,
    },
    #[serde(rename = "LLM")]
    Llm {
        model_id: Option<i64>,
        #[serde(default)]
        system_prompt: String,
        #[serde(default)]
        user_prompt: String,
        temperature: Option<f64>,
        max_tokens: Option<u32>,
    },
    Code {
        language: CodeLanguage,
        #[serde(default)]
        source: String,
    },
    Condition {
        branches: Vec<ConditionBranch>,
    },
    IntentRecognition {
        intents: Vec<IntentRoute>,
    },
    #[serde(rename = "QA")]
    Qa {
        #[serde(default)]
        question: String,
        answer_type: AnswerType,
        #[serde(default)]
        options: Vec<QaOption>,
        max_reply_count: Option<u32>,
    },
    #[serde(rename = "HTTPRequest")]
    Http {
        method: Option<HttpMethod>,
        #[serde(default)]
        url: String,
        #[serde(default)]
        headers: Vec<ArgSpec>,
        #[serde(default)]
        queries: Vec<ArgSpec>,
        #[serde(default)]
        body: Vec<ArgSpec>,
        timeout_secs: Option<u32>,
    },
    Knowledge {
        #[serde(default)]
        knowledge_base_ids: Vec<i64>,
        max_recall_count: Option<u32>,
        matching_degree: Option<f64>,
    },
    Variable {
        mode: VariableMode,
    },
    Loop {
        mode: Option<LoopMode>,
        loop_times: Option<u32>,
        #[serde(default)]
        variable_args: Vec<ArgSpec>,
        inner_start_node_id: Option<NodeId>,
        inner_end_node_id: Option<NodeId>,
    },
    LoopStart,
    LoopEnd,
    LoopBreak,
    LoopContinue,
    TableQuery {
        table_id: Option<i64>,
    },
    TableAdd {
        table_id: Option<i64>,
    },
    TableUpdate {
        table_id: Option<i64>,
    },
    TableDelete {
        table_id: Option<i64>,
    },
    #[serde(rename = "TableSQL")]
    TableSql {
        #[serde(default)]
        sql: String,
    },
    TextProcessing {
        op: TextOp,
        #[serde(default)]
        join: String,
        #[serde(default)]
        splits: Vec<String>,
    },
    DocumentExtraction,
    Output {
        #[serde(default)]
        content: String,
    },
    Plugin {
        plugin_id: Option<i64>,
    },
    #[serde(rename = "Workflow")]
    SubWorkflow {
        workflow_ref: Option<WorkflowId>,
    },
    Mcp {
        mcp_id: Option<i64>,
        #[serde(default)]
        tool_name: String,
    },
}

/// Fieldless discriminant of `NodeParams`, used for dispatch tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Start,
    End,
    Llm,
    Code,
    Condition,
    IntentRecognition,
    Qa,
    Http,
    Knowledge,
    Variable,
    Loop,
    LoopStart,
    LoopEnd,
    LoopBreak,
    LoopContinue,
    TableQuery,
    TableAdd,
    TableUpdate,
    TableDelete,
    TableSql,
    TextProcessing,
    DocumentExtraction,
    Output,
    Plugin,
    SubWorkflow,
    Mcp,
}

impl NodeKind {
    /// Start/End and the loop body boundary nodes cannot be removed.
    #[must_use]
    pub const fn is_deletable(self) -> bool {
        !matches!(self, Self::Start | Self::End | Self::LoopStart | Self::LoopEnd)
    }

    /// Loop-control kinds that are managed by their owning loop node.
    #[must_use]
    pub const fn is_loop_control(self) -> bool {
        matches!(
            self,
            Self::LoopStart | Self::LoopEnd | Self::LoopBreak | Self::LoopContinue
        )
    }

    /// Kinds that may carry an `ExceptionConfig`.
    #[must_use]
    pub const fn supports_exception_handling(self) -> bool {
        matches!(
            self,
            Self::Llm
                | Self::Plugin
                | Self::SubWorkflow
                | Self::Mcp
                | Self::Code
                | Self::IntentRecognition
                | Self::Knowledge
                | Self::TableQuery
                | Self::TableAdd
                | Self::TableUpdate
                | Self::TableDelete
                | Self::TableSql
                | Self::Qa
                | Self::DocumentExtraction
                | Self::Http
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl NodeParams {
    /// Returns the discriminant of this payload.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Start => NodeKind::Start,
            Self::End { .. } => NodeKind::End,
            Self::Llm { .. } => NodeKind::Llm,
            Self::Code { .. } => NodeKind::Code,
            Self::Condition { .. } => NodeKind::Condition,
            Self::IntentRecognition { .. } => NodeKind::IntentRecognition,
            Self::Qa { .. } => NodeKind::Qa,
            Self::Http { .. } => NodeKind::Http,
            Self::Knowledge { .. } => NodeKind::Knowledge,
            Self::Variable { .. } => NodeKind::Variable,
            Self::Loop { .. } => NodeKind::Loop,
            Self::LoopStart => NodeKind::LoopStart,
            Self::LoopEnd => NodeKind::LoopEnd,
            Self::LoopBreak => NodeKind::LoopBreak,
            Self::LoopContinue => NodeKind::LoopContinue,
            Self::TableQuery { .. } => NodeKind::TableQuery,
            Self::TableAdd { .. } => NodeKind::TableAdd,
            Self::TableUpdate { .. } => NodeKind::TableUpdate,
            Self::TableDelete { .. } => NodeKind::TableDelete,
            Self::TableSql { .. } => NodeKind::TableSql,
            Self::TextProcessing { .. } => NodeKind::TextProcessing,
            Self::DocumentExtraction => NodeKind::DocumentExtraction,
            Self::Output { .. } => NodeKind::Output,
            Self::Plugin { .. } => NodeKind::Plugin,
            Self::SubWorkflow { .. } => NodeKind::SubWorkflow,
            Self::Mcp { .. } => NodeKind::Mcp,
        }
    }

    /// True when this payload routes its successors through branch ports.
    #[must_use]
    pub fn uses_branch_ports(&self) -> bool {
        match self {
            Self::Condition { .. } | Self::IntentRecognition { .. } => true,
            Self::Qa { answer_type, .. } => *answer_type == AnswerType::Select,
            _ => false,
        }
    }

    /// Branch entries as `(uuid, targets)` pairs; empty for non-branching
    /// payloads and for QA nodes in text-answer mode.
    #[must_use]
    pub fn branch_links(&self) -> Vec<(BranchId, &[NodeId])> {
        match self {
            Self::Condition { branches } => branches
                .iter()
                .map(|b| (b.uuid, b.next_node_ids.as_slice()))
                .collect(),
            Self::IntentRecognition { intents } => intents
                .iter()
                .map(|i| (i.uuid, i.next_node_ids.as_slice()))
                .collect(),
            Self::Qa {
                answer_type: AnswerType::Select,
                options,
                ..
            } => options
                .iter()
                .map(|o| (o.uuid, o.next_node_ids.as_slice()))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Rewrites every branch entry's targets from the given map. Branches
    /// absent from the map are emptied. Only the synchronizer calls this.
    pub(crate) fn set_branch_targets(&mut self, targets: &HashMap<BranchId, Vec<NodeId>>) {
        match self {
            Self::Condition { branches } => {
                for branch in branches {
                    branch.next_node_ids = targets.get(&branch.uuid).cloned().unwrap_or_default();
                }
            }
            Self::IntentRecognition { intents } => {
                for intent in intents {
                    intent.next_node_ids = targets.get(&intent.uuid).cloned().unwrap_or_default();
                }
            }
            Self::Qa {
                answer_type: AnswerType::Select,
                options,
                ..
            } => {
                for option in options {
                    option.next_node_ids = targets.get(&option.uuid).cloned().unwrap_or_default();
                }
            }
            _ => {}
        }
    }
}

/// Configuration shared by all node types: declared arguments, failure
/// handling, and the type-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default)]
    pub input_args: Vec<ArgSpec>,
    #[serde(default)]
    pub output_args: Vec<ArgSpec>,
    #[serde(default)]
    pub exception: Option<ExceptionConfig>,
    #[serde(flatten)]
    pub params: NodeParams,
}

impl NodeConfig {
    /// Wraps a payload with empty argument lists.
    #[must_use]
    pub fn new(params: NodeParams) -> Self {
        Self {
            input_args: Vec::new(),
            output_args: Vec::new(),
            exception: None,
            params,
        }
    }
}

/// A workflow node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier within the workflow.
    pub id: NodeId,
    /// Human-readable name.
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// The workflow this node belongs to.
    pub workflow_id: WorkflowId,
    /// Plain downstream pointers. Branching kinds keep these empty and use
    /// the pointers embedded in their branch entries instead.
    #[serde(default)]
    pub next_node_ids: Vec<NodeId>,
    /// Back-reference to the owning loop node for loop-body members.
    #[serde(default)]
    pub loop_node_id: Option<NodeId>,
    pub config: NodeConfig,
}

impl Node {
    /// Creates a node from an explicit configuration.
    #[must_use]
    pub fn new(
        id: NodeId,
        workflow_id: WorkflowId,
        name: impl Into<String>,
        config: NodeConfig,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            workflow_id,
            next_node_ids: Vec::new(),
            loop_node_id: None,
            config,
        }
    }

    /// Creates a node of the given kind with its default configuration.
    #[must_use]
    pub fn create(kind: NodeKind, id: NodeId, workflow_id: WorkflowId) -> Self {
        Self::new(id, workflow_id, kind.to_string(), default_config(kind))
    }

    /// Returns the node's type discriminant.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.config.params.kind()
    }

    /// The loop-membership predicate: true when this node lives inside the
    /// body of the given loop node.
    #[must_use]
    pub fn is_in_loop_body(&self, loop_id: NodeId) -> bool {
        self.loop_node_id == Some(loop_id)
    }
}

/// Default configuration assigned by the "create node" action.
#[must_use]
pub fn default_config(kind: NodeKind) -> NodeConfig {
    let params = match kind {
        NodeKind::Start => NodeParams::Start,
        NodeKind::End => NodeParams::End { return_type: None },
        NodeKind::Llm => NodeParams::Llm {
            model_id: None,
            system_prompt: String::new(),
            user_prompt: String::new(),
            temperature: None,
            max_tokens: None,
        },
        NodeKind::Code => NodeParams::Code {
            language: CodeLanguage::Python,
            source: String::new(),
        },
        NodeKind::Condition => NodeParams::Condition {
            branches: vec![
                ConditionBranch::new(BranchKind::If),
                ConditionBranch::new(BranchKind::Else),
            ],
        },
        NodeKind::IntentRecognition => NodeParams::IntentRecognition {
            intents: Vec::new(),
        },
        NodeKind::Qa => NodeParams::Qa {
            question: String::new(),
            answer_type: AnswerType::Text,
            options: Vec::new(),
            max_reply_count: None,
        },
        NodeKind::Http => NodeParams::Http {
            method: None,
            url: String::new(),
            headers: Vec::new(),
            queries: Vec::new(),
            body: Vec::new(),
            timeout_secs: None,
        },
        NodeKind::Knowledge => NodeParams::Knowledge {
            knowledge_base_ids: Vec::new(),
            max_recall_count: None,
            matching_degree: None,
        },
        NodeKind::Variable => NodeParams::Variable {
            mode: VariableMode::GetVariable,
        },
        NodeKind::Loop => NodeParams::Loop {
            mode: None,
            loop_times: None,
            variable_args: Vec::new(),
            inner_start_node_id: None,
            inner_end_node_id: None,
        },
        NodeKind::LoopStart => NodeParams::LoopStart,
        NodeKind::LoopEnd => NodeParams::LoopEnd,
        NodeKind::LoopBreak => NodeParams::LoopBreak,
        NodeKind::LoopContinue => NodeParams::LoopContinue,
        NodeKind::TableQuery => NodeParams::TableQuery { table_id: None },
        NodeKind::TableAdd => NodeParams::TableAdd { table_id: None },
        NodeKind::TableUpdate => NodeParams::TableUpdate { table_id: None },
        NodeKind::TableDelete => NodeParams::TableDelete { table_id: None },
        NodeKind::TableSql => NodeParams::TableSql { sql: String::new() },
        NodeKind::TextProcessing => NodeParams::TextProcessing {
            op: TextOp::Concat,
            join: String::new(),
            splits: Vec::new(),
        },
        NodeKind::DocumentExtraction => NodeParams::DocumentExtraction,
        NodeKind::Output => NodeParams::Output {
            content: String::new(),
        },
        NodeKind::Plugin => NodeParams::Plugin { plugin_id: None },
        NodeKind::SubWorkflow => NodeParams::SubWorkflow { workflow_ref: None },
        NodeKind::Mcp => NodeParams::Mcp {
            mcp_id: None,
            tool_name: String::new(),
        },
    };
    NodeConfig::new(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_condition_node_has_if_and_else_branches() {
        let node = Node::create(NodeKind::Condition, NodeId::new(1), WorkflowId::new(1));
        let NodeParams::Condition { branches } = &node.config.params else {
            panic!("expected condition params");
        };
        assert_eq!(branches.len(), 2);
        assert_eq!(branches[0].kind, BranchKind::If);
        assert_eq!(branches[1].kind, BranchKind::Else);
        assert_ne!(branches[0].uuid, branches[1].uuid);
    }

    #[test]
    fn kind_matches_params() {
        let node = Node::create(NodeKind::Http, NodeId::new(2), WorkflowId::new(1));
        assert_eq!(node.kind(), NodeKind::Http);
    }

    #[test]
    fn branch_links_empty_for_text_qa() {
        let params = NodeParams::Qa {
            question: "pick one".to_string(),
            answer_type: AnswerType::Text,
            options: vec![QaOption::new("A")],
            max_reply_count: None,
        };
        assert!(params.branch_links().is_empty());
        assert!(!params.uses_branch_ports());
    }

    #[test]
    fn branch_links_expose_select_qa_options() {
        let option = QaOption::new("A");
        let uuid = option.uuid;
        let params = NodeParams::Qa {
            question: "pick one".to_string(),
            answer_type: AnswerType::Select,
            options: vec![option],
            max_reply_count: None,
        };
        let links = params.branch_links();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].0, uuid);
    }

    #[test]
    fn structural_kinds_are_not_deletable() {
        assert!(!NodeKind::Start.is_deletable());
        assert!(!NodeKind::End.is_deletable());
        assert!(!NodeKind::LoopStart.is_deletable());
        assert!(NodeKind::Llm.is_deletable());
    }

    #[test]
    fn exception_config_switches_to_flow_on_add() {
        let mut config = ExceptionConfig::default();
        assert!(config.flow_targets().is_empty());

        config.add_flow_target(NodeId::new(9));
        config.add_flow_target(NodeId::new(9));
        assert_eq!(config.flow_targets(), &[NodeId::new(9)]);

        config.remove_flow_target(NodeId::new(9));
        assert!(config.flow_targets().is_empty());
    }

    #[test]
    fn data_type_array_helpers() {
        assert!(DataType::ArrayString.is_array());
        assert_eq!(DataType::ArrayObject.element_type(), Some(DataType::Object));
        assert_eq!(DataType::array_of(DataType::Integer), DataType::ArrayInteger);
        assert_eq!(
            DataType::array_of(DataType::ArrayInteger),
            DataType::ArrayInteger
        );
    }

    #[test]
    fn node_serde_roundtrip_keeps_tagged_params() {
        let mut node = Node::create(NodeKind::Llm, NodeId::new(5), WorkflowId::new(3));
        node.config.input_args.push(
            ArgSpec::required("prompt_context", DataType::String)
                .with_binding(Binding::reference("4.output")),
        );

        let json = serde_json::to_string(&node).expect("serialize");
        assert!(json.contains("\"type\":\"LLM\""));
        let parsed: Node = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(node, parsed);
    }

    #[test]
    fn set_branch_targets_empties_missing_branches() {
        let branch = ConditionBranch::new(BranchKind::If);
        let uuid = branch.uuid;
        let mut params = NodeParams::Condition {
            branches: vec![branch, ConditionBranch::new(BranchKind::Else)],
        };

        let mut targets = HashMap::new();
        targets.insert(uuid, vec![NodeId::new(7)]);
        params.set_branch_targets(&targets);

        let links = params.branch_links();
        assert_eq!(links[0].1, &[NodeId::new(7)]);
        assert!(links[1].1.is_empty());
    }
}
