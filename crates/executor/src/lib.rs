//! Query executor: runs a parsed query against the graph inside one
//! transaction.
//!
//! Clauses execute in source order over a binding environment mapping
//! variable names to lists of nodes or lists of edges. Mutations go through
//! the graph manager first and are recorded in the transaction log after
//! they succeed. Any failure aborts the whole query; operations already
//! applied are not undone.


use common::{
    Edge, KiteError, KiteResult, Node, NodeId, Property, ResultRow, RowValue, TxnId,
};
use graph::GraphStore;
use parser::{Clause, NodePattern, Pattern, PropertyExpr, Query, RelPattern};
use std::collections::{HashMap, HashSet};
use wal::{Operation, TxnManager};

/// Mutable references to the engine state a query executes against.
pub struct ExecutionContext<'a> {
    pub graph: &'a mut GraphStore,
    pub txns: &'a mut TxnManager,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(graph: &'a mut GraphStore, txns: &'a mut TxnManager) -> Self {
        Self { graph, txns }
    }
}

/// What a query variable is bound to: a list of nodes or a list of edges,
/// in insertion order.
#[derive(Clone, Debug)]
enum Binding {
    Nodes(Vec<Node>),
    Edges(Vec<Edge>),
}

type Environment = HashMap<String, Binding>;

/// Execute a parsed query under an open transaction, returning the RETURN
/// rows (empty when the query has no RETURN clause).
pub fn execute(query: &Query, txn: TxnId, ctx: &mut ExecutionContext<'_>) -> KiteResult<Vec<ResultRow>> {
    let mut env = Environment::new();
    let mut rows = Vec::new();

    for clause in &query.clauses {
        match clause {
            Clause::Create(patterns) => {
                for pattern in patterns {
                    create_pattern(pattern, txn, ctx, &mut env)?;
                }
            }
            Clause::Match(patterns) => {
                // Each pattern binds independently; there is no
                // cross-pattern join.
                for pattern in patterns {
                    match_pattern(pattern, ctx, &mut env)?;
                }
            }
            Clause::Where(predicate) => apply_where(predicate, &mut env)?,
            Clause::Set(assignments) => {
                for assignment in assignments {
                    apply_set(assignment, txn, ctx, &mut env)?;
                }
            }
            Clause::Delete(variables) => {
                for variable in variables {
                    apply_delete(variable, txn, ctx, &mut env)?;
                }
            }
            Clause::Return(variables) => {
                rows = collect_rows(variables, &env)?;
            }
        }
    }

    Ok(rows)
}

fn create_pattern(
    pattern: &Pattern,
    txn: TxnId,
    ctx: &mut ExecutionContext<'_>,
    env: &mut Environment,
) -> KiteResult<()> {
    let Some((rel, end)) = &pattern.rel else {
        let node = create_node(&pattern.start, txn, ctx)?;
        if let Some(variable) = &pattern.start.variable {
            append_node(env, variable, node)?;
        }
        return Ok(());
    };

    let source = resolve_endpoint(&pattern.start, txn, ctx, env)?;
    let target = resolve_endpoint(end, txn, ctx, env)?;
    let edge = create_edge(rel, source, target, txn, ctx)?;
    if let Some(variable) = &rel.variable {
        append_edge(env, variable, edge)?;
    }
    Ok(())
}

/// An endpoint variable bound to exactly one node is reused; anything else
/// gets a fresh node built from the endpoint's pattern.
fn resolve_endpoint(
    pattern: &NodePattern,
    txn: TxnId,
    ctx: &mut ExecutionContext<'_>,
    env: &mut Environment,
) -> KiteResult<NodeId> {
    if let Some(variable) = &pattern.variable {
        if let Some(Binding::Nodes(nodes)) = env.get(variable) {
            if let [only] = nodes.as_slice() {
                return Ok(only.id);
            }
        }
    }

    let node = create_node(pattern, txn, ctx)?;
    let id = node.id;
    if let Some(variable) = &pattern.variable {
        append_node(env, variable, node)?;
    }
    Ok(id)
}

fn create_node(
    pattern: &NodePattern,
    txn: TxnId,
    ctx: &mut ExecutionContext<'_>,
) -> KiteResult<Node> {
    let labels = pattern.label.iter().cloned().collect();
    let node = Node::new(labels, pattern_properties(&pattern.properties));

    let id = ctx.graph.add_node(node)?;
    ctx.txns.record(txn, Operation::AddNode { id })?;
    ctx.graph.get_node(id)
}

fn create_edge(
    rel: &RelPattern,
    source: NodeId,
    target: NodeId,
    txn: TxnId,
    ctx: &mut ExecutionContext<'_>,
) -> KiteResult<Edge> {
    let ty = rel
        .ty
        .as_deref()
        .ok_or_else(|| KiteError::InvalidArgument("relationship type is required".into()))?;
    let edge = Edge::new(ty, source, target, pattern_properties(&rel.properties));

    let id = ctx.graph.add_edge(edge)?;
    ctx.txns.record(txn, Operation::AddEdge { id })?;
    ctx.graph.get_edge(id)
}

fn match_pattern(
    pattern: &Pattern,
    ctx: &mut ExecutionContext<'_>,
    env: &mut Environment,
) -> KiteResult<()> {
    let Some((rel, end)) = &pattern.rel else {
        let label = pattern.start.label.as_deref().ok_or_else(|| {
            KiteError::InvalidArgument("MATCH on a node pattern requires a label".into())
        })?;

        let ids: Vec<NodeId> = ctx.graph.nodes_with_label(label).to_vec();
        let mut nodes = Vec::with_capacity(ids.len());
        for id in ids {
            nodes.push(ctx.graph.get_node(id)?);
        }
        if let Some(variable) = &pattern.start.variable {
            env.insert(variable.clone(), Binding::Nodes(nodes));
        }
        return Ok(());
    };

    let ty = rel.ty.as_deref().ok_or_else(|| {
        KiteError::InvalidArgument("MATCH on a relationship pattern requires a type".into())
    })?;

    // Full scan of the edge index in ascending id order; there is no
    // secondary index on type.
    let mut edges = Vec::new();
    for id in ctx.graph.edge_ids() {
        let edge = ctx.graph.get_edge(id)?;
        if edge.ty == ty {
            edges.push(edge);
        }
    }

    // Endpoint variables bind to the parallel per-edge node lists,
    // duplicates and all.
    if let Some(variable) = &pattern.start.variable {
        let mut sources = Vec::with_capacity(edges.len());
        for edge in &edges {
            sources.push(ctx.graph.get_node(edge.source)?);
        }
        env.insert(variable.clone(), Binding::Nodes(sources));
    }
    if let Some(variable) = &end.variable {
        let mut targets = Vec::with_capacity(edges.len());
        for edge in &edges {
            targets.push(ctx.graph.get_node(edge.target)?);
        }
        env.insert(variable.clone(), Binding::Nodes(targets));
    }
    if let Some(variable) = &rel.variable {
        env.insert(variable.clone(), Binding::Edges(edges));
    }
    Ok(())
}

fn apply_where(predicate: &PropertyExpr, env: &mut Environment) -> KiteResult<()> {
    let binding = env
        .get_mut(&predicate.variable)
        .ok_or_else(|| unbound(&predicate.variable))?;

    let wanted = predicate.value.to_value();
    match binding {
        Binding::Nodes(nodes) => {
            nodes.retain(|node| property_matches(&node.properties, &predicate.key, &wanted));
        }
        Binding::Edges(edges) => {
            edges.retain(|edge| property_matches(&edge.properties, &predicate.key, &wanted));
        }
    }
    Ok(())
}

fn apply_set(
    assignment: &PropertyExpr,
    txn: TxnId,
    ctx: &mut ExecutionContext<'_>,
    env: &mut Environment,
) -> KiteResult<()> {
    let binding = env
        .get_mut(&assignment.variable)
        .ok_or_else(|| unbound(&assignment.variable))?;

    let patch = vec![Property {
        key: assignment.key.clone(),
        value: assignment.value.to_value(),
    }];

    // Bindings are refreshed with the merged entities so later clauses in
    // the same query observe the new values.
    match binding {
        Binding::Nodes(nodes) => {
            for node in nodes.iter_mut() {
                *node = ctx.graph.update_node(node.id, &patch)?;
                ctx.txns.record(
                    txn,
                    Operation::UpdateNode {
                        id: node.id,
                        patch: patch.clone(),
                    },
                )?;
            }
        }
        Binding::Edges(edges) => {
            for edge in edges.iter_mut() {
                *edge = ctx.graph.update_edge(edge.id, &patch)?;
                ctx.txns.record(
                    txn,
                    Operation::UpdateEdge {
                        id: edge.id,
                        patch: patch.clone(),
                    },
                )?;
            }
        }
    }
    Ok(())
}

fn apply_delete(
    variable: &str,
    txn: TxnId,
    ctx: &mut ExecutionContext<'_>,
    env: &mut Environment,
) -> KiteResult<()> {
    let binding = env.remove(variable).ok_or_else(|| unbound(variable))?;

    match binding {
        Binding::Nodes(nodes) => {
            for node in nodes {
                ctx.graph.delete_node(node.id)?;
                ctx.txns.record(txn, Operation::DeleteNode { id: node.id })?;
            }
        }
        Binding::Edges(edges) => {
            for edge in edges {
                ctx.graph.delete_edge(edge.id)?;
                ctx.txns.record(txn, Operation::DeleteEdge { id: edge.id })?;
            }
        }
    }
    Ok(())
}

fn collect_rows(variables: &[String], env: &Environment) -> KiteResult<Vec<ResultRow>> {
    // Rows are deduplicated by (kind, id) across the whole RETURN list;
    // order follows the RETURN list, then binding insertion order.
    let mut seen: HashSet<(bool, i64)> = HashSet::new();
    let mut rows = Vec::new();

    for variable in variables {
        let binding = env.get(variable).ok_or_else(|| unbound(variable))?;
        match binding {
            Binding::Nodes(nodes) => {
                for node in nodes {
                    if seen.insert((false, node.id.0)) {
                        rows.push(ResultRow::new(variable, RowValue::from(node)));
                    }
                }
            }
            Binding::Edges(edges) => {
                for edge in edges {
                    if seen.insert((true, edge.id.0)) {
                        rows.push(ResultRow::new(variable, RowValue::from(edge)));
                    }
                }
            }
        }
    }
    Ok(rows)
}

fn pattern_properties(pairs: &[(String, parser::Literal)]) -> Vec<Property> {
    pairs
        .iter()
        .map(|(key, literal)| Property {
            key: key.clone(),
            value: literal.to_value(),
        })
        .collect()
}

fn property_matches(properties: &[Property], key: &str, wanted: &types::Value) -> bool {
    properties
        .iter()
        .filter(|p| p.key == key)
        .any(|p| p.value.eq_same_kind(wanted) == Some(true))
}

fn append_node(env: &mut Environment, variable: &str, node: Node) -> KiteResult<()> {
    match env
        .entry(variable.to_string())
        .or_insert_with(|| Binding::Nodes(Vec::new()))
    {
        Binding::Nodes(nodes) => {
            nodes.push(node);
            Ok(())
        }
        Binding::Edges(_) => Err(KiteError::Type(format!(
            "variable {variable} is bound to edges, not nodes"
        ))),
    }
}

fn append_edge(env: &mut Environment, variable: &str, edge: Edge) -> KiteResult<()> {
    match env
        .entry(variable.to_string())
        .or_insert_with(|| Binding::Edges(Vec::new()))
    {
        Binding::Edges(edges) => {
            edges.push(edge);
            Ok(())
        }
        Binding::Nodes(_) => Err(KiteError::Type(format!(
            "variable {variable} is bound to nodes, not edges"
        ))),
    }
}

fn unbound(variable: &str) -> KiteError {
    KiteError::NotFound(format!("variable {variable} is not bound"))
}
