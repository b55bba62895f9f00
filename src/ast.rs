//! AST node types for parsed Soar productions.
//!
//! The rule-language parser is an external collaborator: it hands the engine
//! a [`ProductionAst`] and the engine never looks at rule text itself. The
//! fixed set of node kinds below is the contract between the two sides; the
//! materializer dispatches exhaustively over it, so adding a kind without
//! teaching the materializer about it is a compile error.

// ============================================================================
// Production (root)
// ============================================================================

/// The root AST node for one parsed production.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionAst {
    pub name: String,
    /// Left-hand side: the conditions before `-->`.
    pub conditions: Vec<Condition>,
    /// Right-hand side: the actions after `-->`.
    pub actions: Vec<Action>,
}

// ============================================================================
// Left-hand side
// ============================================================================

/// A condition, possibly negated.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub negated: bool,
    pub positive_condition: PositiveCondition,
}

/// Either a conjunction of conditions or a test against one identifier.
#[derive(Debug, Clone, PartialEq)]
pub enum PositiveCondition {
    Conjunction(Vec<Condition>),
    IdentifierCondition(IdentifierCondition),
}

/// Tests against a single identifier, e.g. `(state <s> ^foo <v>)`.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierCondition {
    /// True when the condition tests the state, `(state <s> ...)`.
    pub has_state: bool,
    pub variable: String,
    pub attribute_value_tests: Vec<AttributeValueTest>,
}

/// One `^attribute value` test, possibly negated, possibly dotted
/// (`^a.b.c value` carries one attribute test per path segment).
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeValueTest {
    pub negated: bool,
    pub attribute_tests: Vec<AttributeTest>,
    pub value_tests: Vec<ValueTest>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeTest {
    pub test: Test,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueTest {
    pub test: Test,
    /// True when the value carries a `+` acceptable preference test.
    pub acceptable_preference: bool,
}

/// A test is either a conjunction `{ ... }` or a simple test.
#[derive(Debug, Clone, PartialEq)]
pub enum Test {
    Conjunctive(ConjunctiveTest),
    Simple(SimpleTest),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConjunctiveTest {
    pub simple_tests: Vec<SimpleTest>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimpleTest {
    /// A disjunction `<< a b c >>`.
    Disjunction(DisjunctionTest),
    Relational(RelationalTest),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisjunctionTest {
    pub constants: Vec<Constant>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationalTest {
    pub relation: Relation,
    pub single_test: SingleTest,
}

/// Relation operators on tests. The numeric codes are stored in the
/// `relation` column and are part of the storage contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    SameType,
}

impl Relation {
    pub fn code(self) -> i64 {
        match self {
            Relation::Equal => 0,
            Relation::NotEqual => 1,
            Relation::Less => 2,
            Relation::LessEqual => 3,
            Relation::Greater => 4,
            Relation::GreaterEqual => 5,
            Relation::SameType => 6,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Relation::Equal => "=",
            Relation::NotEqual => "<>",
            Relation::Less => "<",
            Relation::LessEqual => "<=",
            Relation::Greater => ">",
            Relation::GreaterEqual => ">=",
            Relation::SameType => "<=>",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SingleTest {
    Constant(Constant),
    Variable(String),
}

/// A literal constant. The `constant_type` column stores the code; the
/// typed value goes in the matching `*_const` column.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Symbolic(String),
    Integer(i64),
    Float(f64),
}

impl Constant {
    pub fn type_code(&self) -> i64 {
        match self {
            Constant::Symbolic(_) => 0,
            Constant::Integer(_) => 1,
            Constant::Float(_) => 2,
        }
    }
}

// ============================================================================
// Right-hand side
// ============================================================================

/// An action: either a make on a variable or a standalone function call.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    VarAttrValMake(VarAttrValMake),
    FunctionCall(FunctionCall),
}

/// `(<v> ^attr value ...)` on the right-hand side.
#[derive(Debug, Clone, PartialEq)]
pub struct VarAttrValMake {
    pub variable: String,
    pub attribute_value_makes: Vec<AttributeValueMake>,
}

/// One `^attr value+` make. Dotted attributes carry one RHS value per
/// path segment.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeValueMake {
    pub rhs_values: Vec<RhsValue>,
    pub value_makes: Vec<ValueMake>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RhsValue {
    Constant(Constant),
    FunctionCall(FunctionCall),
    Variable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub function_name: String,
    pub rhs_values: Vec<RhsValue>,
}

/// A made value with its preference specifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueMake {
    pub rhs_value: RhsValue,
    pub preference_specifiers: Vec<PreferenceSpecifier>,
}

/// Preferences that are unary by nature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NaturallyUnaryPreference {
    Acceptable,
    Reject,
    Require,
    Prohibit,
    UnaryIndifferent,
}

/// Preferences that take a reference value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryPreferenceKind {
    Better,
    Worse,
    BinaryIndifferent,
}

/// A preference specifier on a made value. Binary kinds may appear without
/// their reference value ("forced unary").
#[derive(Debug, Clone, PartialEq)]
pub enum PreferenceSpecifier {
    NaturallyUnary(NaturallyUnaryPreference),
    Binary {
        kind: BinaryPreferenceKind,
        rhs: RhsValue,
    },
    ForcedUnary(BinaryPreferenceKind),
}

impl PreferenceSpecifier {
    pub fn is_unary(&self) -> bool {
        !matches!(self, PreferenceSpecifier::Binary { .. })
    }

    /// Code stored in the `preference_specifier_type` column.
    pub fn type_code(&self) -> i64 {
        match self {
            PreferenceSpecifier::NaturallyUnary(p) => match p {
                NaturallyUnaryPreference::Acceptable => 0,
                NaturallyUnaryPreference::Reject => 1,
                NaturallyUnaryPreference::Require => 2,
                NaturallyUnaryPreference::Prohibit => 3,
                NaturallyUnaryPreference::UnaryIndifferent => 4,
            },
            PreferenceSpecifier::Binary { kind, .. } | PreferenceSpecifier::ForcedUnary(kind) => {
                match kind {
                    BinaryPreferenceKind::Better => 5,
                    BinaryPreferenceKind::Worse => 6,
                    BinaryPreferenceKind::BinaryIndifferent => 7,
                }
            }
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            PreferenceSpecifier::NaturallyUnary(p) => match p {
                NaturallyUnaryPreference::Acceptable => "+",
                NaturallyUnaryPreference::Reject => "-",
                NaturallyUnaryPreference::Require => "!",
                NaturallyUnaryPreference::Prohibit => "~",
                NaturallyUnaryPreference::UnaryIndifferent => "=",
            },
            PreferenceSpecifier::Binary { kind, .. } | PreferenceSpecifier::ForcedUnary(kind) => {
                match kind {
                    BinaryPreferenceKind::Better => ">",
                    BinaryPreferenceKind::Worse => "<",
                    BinaryPreferenceKind::BinaryIndifferent => "=",
                }
            }
        }
    }
}
