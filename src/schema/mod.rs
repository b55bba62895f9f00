//! Static schema declarations for the project graph.
//!
//! Every persisted entity kind is a [`Table`]; the relationships between
//! tables (structural parent/child, undirected joins, directed joins,
//! automatically-created children, editable columns, presentation folders)
//! live in an immutable [`SchemaRegistry`] built once at startup and shared
//! by reference.
//!
//! The naming scheme here is a storage compatibility contract:
//!
//! ```text
//! table name            agents, problem_spaces, ...
//! short name            table name minus the trailing 's'
//! id column             <short name>_id
//! join table            join_<first>_<second>       (declaration order)
//! directed join table   directed_join_<parent>_<child>
//! ```

use std::collections::HashMap;

/// An entity kind in the project graph.
///
/// Rows in join tables are not represented here; they are edges, not
/// entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Agents,
    ProblemSpaces,
    Operators,

    // Rule structure
    Rules,
    Conditions,
    PositiveConditions,
    ConditionForOneIdentifiers,
    AttributeValueTests,
    AttributeTests,
    ValueTests,
    Tests,
    ConjunctiveTests,
    SimpleTests,
    DisjunctionTests,
    RelationalTests,
    SingleTests,
    Constants,
    Actions,
    VarAttrValMakes,
    AttributeValueMakes,
    FunctionCalls,
    RhsValues,
    ValueMakes,
    PreferenceSpecifiers,

    // Datamap
    DatamapIdentifiers,
    DatamapEnumerations,
    DatamapEnumerationValues,
    DatamapIntegers,
    DatamapFloats,
    DatamapStrings,
}

impl Table {
    /// All tables, in declaration order.
    pub const ALL: [Table; 30] = [
        Table::Agents,
        Table::ProblemSpaces,
        Table::Operators,
        Table::Rules,
        Table::Conditions,
        Table::PositiveConditions,
        Table::ConditionForOneIdentifiers,
        Table::AttributeValueTests,
        Table::AttributeTests,
        Table::ValueTests,
        Table::Tests,
        Table::ConjunctiveTests,
        Table::SimpleTests,
        Table::DisjunctionTests,
        Table::RelationalTests,
        Table::SingleTests,
        Table::Constants,
        Table::Actions,
        Table::VarAttrValMakes,
        Table::AttributeValueMakes,
        Table::FunctionCalls,
        Table::RhsValues,
        Table::ValueMakes,
        Table::PreferenceSpecifiers,
        Table::DatamapIdentifiers,
        Table::DatamapEnumerations,
        Table::DatamapEnumerationValues,
        Table::DatamapIntegers,
        Table::DatamapFloats,
        Table::DatamapStrings,
    ];

    /// The canonical lowercase SQL table name.
    pub fn table_name(self) -> &'static str {
        match self {
            Table::Agents => "agents",
            Table::ProblemSpaces => "problem_spaces",
            Table::Operators => "operators",
            Table::Rules => "rules",
            Table::Conditions => "conditions",
            Table::PositiveConditions => "positive_conditions",
            Table::ConditionForOneIdentifiers => "condition_for_one_identifiers",
            Table::AttributeValueTests => "attribute_value_tests",
            Table::AttributeTests => "attribute_tests",
            Table::ValueTests => "value_tests",
            Table::Tests => "tests",
            Table::ConjunctiveTests => "conjunctive_tests",
            Table::SimpleTests => "simple_tests",
            Table::DisjunctionTests => "disjunction_tests",
            Table::RelationalTests => "relational_tests",
            Table::SingleTests => "single_tests",
            Table::Constants => "constants",
            Table::Actions => "actions",
            Table::VarAttrValMakes => "var_attr_val_makes",
            Table::AttributeValueMakes => "attribute_value_makes",
            Table::FunctionCalls => "function_calls",
            Table::RhsValues => "rhs_values",
            Table::ValueMakes => "value_makes",
            Table::PreferenceSpecifiers => "preference_specifiers",
            Table::DatamapIdentifiers => "datamap_identifiers",
            Table::DatamapEnumerations => "datamap_enumerations",
            Table::DatamapEnumerationValues => "datamap_enumeration_values",
            Table::DatamapIntegers => "datamap_integers",
            Table::DatamapFloats => "datamap_floats",
            Table::DatamapStrings => "datamap_strings",
        }
    }

    /// The singular form: the table name minus its trailing `s`.
    pub fn short_name(self) -> &'static str {
        let name = self.table_name();
        &name[..name.len() - 1]
    }

    /// The foreign-key column name other tables use to reference this table.
    pub fn id_column(self) -> String {
        format!("{}_id", self.short_name())
    }

    /// Look up a table by its SQL name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Table> {
        Table::ALL
            .iter()
            .copied()
            .find(|t| t.table_name().eq_ignore_ascii_case(name))
    }

    /// True for the datamap node tables (the cyclic directed-join subgraph).
    pub fn is_datamap_node(self) -> bool {
        matches!(
            self,
            Table::DatamapIdentifiers
                | Table::DatamapEnumerations
                | Table::DatamapIntegers
                | Table::DatamapFloats
                | Table::DatamapStrings
        )
    }
}

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float,
    Text,
}

impl ColumnType {
    fn sql_type(self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Float => "REAL",
            ColumnType::Text => "TEXT",
        }
    }
}

/// A column that the editor surface may expose for direct editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditableColumn {
    pub name: &'static str,
    pub column_type: ColumnType,
}

impl EditableColumn {
    pub const fn new(name: &'static str, column_type: ColumnType) -> Self {
        EditableColumn { name, column_type }
    }
}

/// Attribute columns each table carries beyond `id`, `name` and its
/// foreign keys. These mirror what the AST materializer writes.
pub fn attribute_columns(table: Table) -> &'static [(&'static str, ColumnType)] {
    use ColumnType::*;
    match table {
        Table::Rules => &[("raw_text", Text)],
        Table::Conditions => &[("is_negated", Integer)],
        Table::PositiveConditions => &[("is_conjunction", Integer)],
        Table::ConditionForOneIdentifiers => &[("has_state", Integer), ("variable", Text)],
        Table::AttributeValueTests => &[("is_negated", Integer)],
        Table::ValueTests => &[("has_acceptable_preference", Integer)],
        Table::Tests => &[("is_conjunctive_test", Integer)],
        Table::SimpleTests => &[("is_disjunction_test", Integer)],
        Table::RelationalTests => &[("relation", Integer)],
        Table::SingleTests => &[("is_constant", Integer), ("variable", Text)],
        Table::Constants => &[
            ("constant_type", Integer),
            ("integer_const", Integer),
            ("floating_const", Float),
            ("symbolic_const", Text),
        ],
        Table::Actions => &[("is_var_attr_val_make", Integer)],
        Table::VarAttrValMakes => &[("variable", Text)],
        Table::FunctionCalls => &[("function_name", Text)],
        Table::RhsValues => &[
            ("is_constant", Integer),
            ("is_function_call", Integer),
            ("is_variable", Integer),
            ("variable", Text),
        ],
        Table::PreferenceSpecifiers => &[
            ("is_unary_preference", Integer),
            ("preference_specifier_type", Integer),
        ],
        Table::DatamapIntegers => &[("min_value", Integer), ("max_value", Integer)],
        Table::DatamapFloats => &[("min_value", Float), ("max_value", Float)],
        _ => &[],
    }
}

/// The name of the undirected join table for a pair declared in this order.
fn join_table_name_ordered(first: Table, second: Table) -> String {
    format!("join_{}_{}", first.table_name(), second.table_name())
}

/// The name of the directed join table from `parent` to `child`.
pub fn directed_join_table_name(parent: Table, child: Table) -> String {
    format!(
        "directed_join_{}_{}",
        parent.table_name(),
        child.table_name()
    )
}

/// Immutable table-relationship registry.
///
/// Built once (see [`SchemaRegistry::soar`]) and read-only thereafter.
/// Querying a relationship that was never declared returns an empty result;
/// absence of a relationship is a normal state, not a failure.
#[derive(Debug, Default, Clone)]
pub struct SchemaRegistry {
    /// Child table -> declared parent tables (polymorphic parentage).
    parents: HashMap<Table, Vec<Table>>,
    /// Parent table -> declared child tables.
    children: HashMap<Table, Vec<Table>>,
    /// Undirected join pairs, in declaration order. The pair order fixes the
    /// join table name and the meaning of its `first_id`/`second_id`.
    joins: Vec<(Table, Table)>,
    /// Directed join pairs (parent, child), in declaration order.
    directed_joins: Vec<(Table, Table)>,
    /// Tables created automatically when a row of the key table is created.
    automatic_children: HashMap<Table, Vec<Table>>,
    /// Columns exposed for editing, per table.
    editable_columns: HashMap<Table, Vec<EditableColumn>>,
    /// Child tables presented inside folders, per table.
    child_folders: HashMap<Table, Vec<Table>>,
}

impl SchemaRegistry {
    /// The standard registry for Soar rule-authoring projects.
    pub fn soar() -> SchemaRegistry {
        let mut r = SchemaRegistry::default();

        // Top-level project structure.
        r.declare_parent(Table::ProblemSpaces, Table::Agents);
        r.declare_parent(Table::Operators, Table::Agents);
        r.declare_parent(Table::Rules, Table::Agents);
        r.declare_child_folders(
            Table::Agents,
            &[Table::ProblemSpaces, Table::Operators, Table::Rules],
        );

        // Rule structure. A table may appear under several parents; the
        // parent relation is resolved at query time by trying each.
        r.declare_parent(Table::Conditions, Table::Rules);
        r.declare_parent(Table::PositiveConditions, Table::Conditions);
        r.declare_parent(Table::Conditions, Table::PositiveConditions);
        r.declare_parent(Table::ConditionForOneIdentifiers, Table::PositiveConditions);
        r.declare_parent(Table::AttributeValueTests, Table::ConditionForOneIdentifiers);
        r.declare_parent(Table::AttributeTests, Table::AttributeValueTests);
        r.declare_parent(Table::ValueTests, Table::AttributeValueTests);
        r.declare_parent(Table::ValueTests, Table::AttributeTests);
        r.declare_parent(Table::Tests, Table::ValueTests);
        r.declare_parent(Table::Tests, Table::AttributeTests);
        r.declare_parent(Table::ConjunctiveTests, Table::Tests);
        r.declare_parent(Table::SimpleTests, Table::ConjunctiveTests);
        r.declare_parent(Table::SimpleTests, Table::Tests);
        r.declare_parent(Table::DisjunctionTests, Table::SimpleTests);
        r.declare_parent(Table::RelationalTests, Table::SimpleTests);
        r.declare_parent(Table::SingleTests, Table::RelationalTests);
        r.declare_parent(Table::Constants, Table::SingleTests);
        r.declare_parent(Table::Constants, Table::DisjunctionTests);
        r.declare_parent(Table::Constants, Table::RhsValues);
        r.declare_parent(Table::Actions, Table::Rules);
        r.declare_parent(Table::VarAttrValMakes, Table::Actions);
        r.declare_parent(Table::AttributeValueMakes, Table::VarAttrValMakes);
        r.declare_parent(Table::FunctionCalls, Table::Actions);
        r.declare_parent(Table::FunctionCalls, Table::RhsValues);
        r.declare_parent(Table::RhsValues, Table::FunctionCalls);
        r.declare_parent(Table::RhsValues, Table::ValueMakes);
        r.declare_parent(Table::RhsValues, Table::AttributeValueMakes);
        r.declare_parent(Table::RhsValues, Table::PreferenceSpecifiers);
        r.declare_parent(Table::ValueMakes, Table::AttributeValueMakes);
        r.declare_parent(Table::PreferenceSpecifiers, Table::ValueMakes);

        // Datamap structure. The root identifier is a structural child of
        // its problem space; everything below it hangs off directed joins
        // because datamap edges can cycle and share children.
        r.declare_parent(Table::DatamapIdentifiers, Table::ProblemSpaces);
        r.declare_parent(Table::DatamapEnumerationValues, Table::DatamapEnumerations);
        r.declare_automatic_children(Table::ProblemSpaces, &[Table::DatamapIdentifiers]);

        r.declare_join(Table::Rules, Table::ProblemSpaces);
        r.declare_join(Table::Rules, Table::Operators);
        r.declare_join(Table::Operators, Table::ProblemSpaces);
        r.declare_join(Table::DatamapIdentifiers, Table::DatamapIdentifiers);

        r.declare_directed_join(Table::DatamapIdentifiers, Table::DatamapIdentifiers);
        r.declare_directed_join(Table::DatamapIdentifiers, Table::DatamapEnumerations);
        r.declare_directed_join(Table::DatamapIdentifiers, Table::DatamapIntegers);
        r.declare_directed_join(Table::DatamapIdentifiers, Table::DatamapFloats);
        r.declare_directed_join(Table::DatamapIdentifiers, Table::DatamapStrings);

        r.declare_editable_column(
            Table::DatamapIntegers,
            EditableColumn::new("min_value", ColumnType::Integer),
        );
        r.declare_editable_column(
            Table::DatamapIntegers,
            EditableColumn::new("max_value", ColumnType::Integer),
        );
        r.declare_editable_column(
            Table::DatamapFloats,
            EditableColumn::new("min_value", ColumnType::Float),
        );
        r.declare_editable_column(
            Table::DatamapFloats,
            EditableColumn::new("max_value", ColumnType::Float),
        );

        r
    }

    // ===== Declarations (construction only) =====

    /// Declare that `child` carries the foreign key `<parent short name>_id`.
    fn declare_parent(&mut self, child: Table, parent: Table) {
        let parents = self.parents.entry(child).or_default();
        if !parents.contains(&parent) {
            parents.push(parent);
        }
        let children = self.children.entry(parent).or_default();
        if !children.contains(&child) {
            children.push(child);
        }
    }

    /// Declare an undirected join. The parameter order fixes the join table
    /// name and column meaning; a pair is declared at most once.
    fn declare_join(&mut self, first: Table, second: Table) {
        if self.ordered_join_pair(first, second).is_none() {
            self.joins.push((first, second));
        }
    }

    /// Declare a directed join from `parent` to `child`.
    fn declare_directed_join(&mut self, parent: Table, child: Table) {
        if !self.directed_joins.contains(&(parent, child)) {
            self.directed_joins.push((parent, child));
        }
    }

    fn declare_automatic_children(&mut self, table: Table, children: &[Table]) {
        self.automatic_children
            .entry(table)
            .or_default()
            .extend_from_slice(children);
    }

    fn declare_editable_column(&mut self, table: Table, column: EditableColumn) {
        self.editable_columns.entry(table).or_default().push(column);
    }

    fn declare_child_folders(&mut self, table: Table, folders: &[Table]) {
        self.child_folders
            .entry(table)
            .or_default()
            .extend_from_slice(folders);
    }

    // ===== Queries =====

    /// Declared structural child tables of `table`.
    pub fn children_of(&self, table: Table) -> &[Table] {
        self.children.get(&table).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Declared structural parent tables of `table`.
    pub fn parents_of(&self, table: Table) -> &[Table] {
        self.parents.get(&table).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All tables joined (undirected) to `table`, from either declaration
    /// direction.
    pub fn join_partners_of(&self, table: Table) -> Vec<Table> {
        let mut partners = Vec::new();
        for &(first, second) in &self.joins {
            if first == table {
                partners.push(second);
            } else if second == table {
                partners.push(first);
            }
        }
        partners
    }

    /// Declared directed-join child tables of `table`.
    pub fn directed_children_of(&self, table: Table) -> Vec<Table> {
        self.directed_joins
            .iter()
            .filter(|(parent, _)| *parent == table)
            .map(|&(_, child)| child)
            .collect()
    }

    /// Reverse lookup over the directed-join declarations. Linear in the
    /// number of declarations, which is small and static.
    pub fn directed_parents_of(&self, table: Table) -> Vec<Table> {
        self.directed_joins
            .iter()
            .filter(|(_, child)| *child == table)
            .map(|&(parent, _)| parent)
            .collect()
    }

    /// Tables whose rows are created automatically under a new row of `table`.
    pub fn automatic_children_of(&self, table: Table) -> &[Table] {
        self.automatic_children
            .get(&table)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn editable_columns_of(&self, table: Table) -> &[EditableColumn] {
        self.editable_columns
            .get(&table)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Child tables shown inside presentation folders under `table`.
    pub fn folder_tables_of(&self, table: Table) -> &[Table] {
        self.child_folders
            .get(&table)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether the two tables are declared joined, in either order.
    pub fn tables_are_joined(&self, first: Table, second: Table) -> bool {
        self.ordered_join_pair(first, second).is_some()
    }

    pub fn tables_are_directed_joined(&self, parent: Table, child: Table) -> bool {
        self.directed_joins.contains(&(parent, child))
    }

    /// The pair in the order it was declared joined (the order its join
    /// table is named), or `None` if the tables aren't joined.
    pub fn ordered_join_pair(&self, first: Table, second: Table) -> Option<(Table, Table)> {
        for &(a, b) in &self.joins {
            if (a, b) == (first, second) || (a, b) == (second, first) {
                return Some((a, b));
            }
        }
        None
    }

    /// The join table name for the pair, independent of argument order.
    /// `None` if the tables aren't declared joined.
    pub fn join_table_name(&self, first: Table, second: Table) -> Option<String> {
        self.ordered_join_pair(first, second)
            .map(|(a, b)| join_table_name_ordered(a, b))
    }

    /// All undirected join pairs, in declaration order.
    pub fn join_pairs(&self) -> &[(Table, Table)] {
        &self.joins
    }

    /// All directed join pairs, in declaration order.
    pub fn directed_join_pairs(&self) -> &[(Table, Table)] {
        &self.directed_joins
    }

    /// DDL for every table and join table in the registry. Statements are
    /// idempotent (`IF NOT EXISTS`) so reopening a project is safe.
    pub fn ddl(&self) -> String {
        let mut out = String::new();
        for table in Table::ALL {
            out.push_str(&self.table_ddl(table));
            out.push('\n');
        }
        for &(first, second) in &self.joins {
            out.push_str(&format!(
                "CREATE TABLE IF NOT EXISTS {} (first_id INTEGER NOT NULL, second_id INTEGER NOT NULL);\n",
                join_table_name_ordered(first, second)
            ));
        }
        for &(parent, child) in &self.directed_joins {
            out.push_str(&format!(
                "CREATE TABLE IF NOT EXISTS {} (parent_id INTEGER NOT NULL, child_id INTEGER NOT NULL);\n",
                directed_join_table_name(parent, child)
            ));
        }
        out
    }

    /// DDL for one entity table: id, name, one foreign key per declared
    /// parent, then the table's attribute columns.
    pub fn table_ddl(&self, table: Table) -> String {
        let mut cols = vec![
            "id INTEGER PRIMARY KEY AUTOINCREMENT".to_string(),
            "name TEXT".to_string(),
        ];
        for parent in self.parents_of(table) {
            cols.push(format!("{} INTEGER", parent.id_column()));
        }
        for &(name, ty) in attribute_columns(table) {
            cols.push(format!("{} {}", name, ty.sql_type()));
        }
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({});",
            table.table_name(),
            cols.join(", ")
        )
    }

    /// Every column of `table`, in DDL order. Used by the dump writer.
    pub fn column_names(&self, table: Table) -> Vec<String> {
        let mut cols = vec!["id".to_string(), "name".to_string()];
        for parent in self.parents_of(table) {
            cols.push(parent.id_column());
        }
        for &(name, _) in attribute_columns(table) {
            cols.push(name.to_string());
        }
        cols
    }
}
