//! StateGraph builder and the compiled, runnable graph

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use tracing::{debug, info};

use super::edge::{Edge, EdgeTarget, END, START};
use super::error::{GraphError, Result};
use super::node::{FunctionNode, Node, NodeOutput, PassthroughNode, SyncNode};
use super::state::{State, StateSchema};

/// Node executions allowed per invocation unless overridden
pub const DEFAULT_RECURSION_LIMIT: usize = 25;

/// Builder for constructing graphs
pub struct StateGraph {
    schema: StateSchema,
    nodes: HashMap<String, Arc<dyn Node>>,
    edges: Vec<Edge>,
    entry_points: Vec<String>,
    duplicate_nodes: Vec<String>,
}

impl StateGraph {
    pub fn new(schema: StateSchema) -> Self {
        Self {
            schema,
            nodes: HashMap::new(),
            edges: Vec::new(),
            entry_points: Vec::new(),
            duplicate_nodes: Vec::new(),
        }
    }

    /// Graph over plain overwrite channels
    pub fn with_channels(channels: &[&str]) -> Self {
        Self::new(StateSchema::simple(channels))
    }

    pub fn add_node<N: Node + 'static>(mut self, node: N) -> Self {
        let name = node.name().to_string();
        if self.nodes.insert(name.clone(), Arc::new(node)).is_some() {
            self.duplicate_nodes.push(name);
        }
        self
    }

    pub fn add_node_fn<F, Fut>(self, name: &str, func: F) -> Self
    where
        F: Fn(State) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<NodeOutput>> + Send + 'static,
    {
        self.add_node(FunctionNode::new(name, func))
    }

    pub fn add_sync_node<F>(self, name: &str, func: F) -> Self
    where
        F: Fn(&State) -> Result<NodeOutput> + Send + Sync + 'static,
    {
        self.add_node(SyncNode::new(name, func))
    }

    pub fn add_passthrough(self, name: &str) -> Self {
        self.add_node(PassthroughNode::new(name))
    }

    /// Direct edge; a `START` source marks the entry point
    pub fn add_edge(mut self, source: &str, target: &str) -> Self {
        if source == START {
            self.entry_points.push(target.to_string());
        } else {
            self.edges.push(Edge::Direct {
                source: source.to_string(),
                target: EdgeTarget::from(target),
            });
        }
        self
    }

    pub fn set_entry_point(self, node: &str) -> Self {
        self.add_edge(START, node)
    }

    pub fn set_finish_point(self, node: &str) -> Self {
        self.add_edge(node, END)
    }

    /// Route out of `source` by the label `router` computes, mapped through `path_map`
    pub fn add_conditional_edges<'a, F, I>(mut self, source: &str, router: F, path_map: I) -> Self
    where
        F: Fn(&State) -> String + Send + Sync + 'static,
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let path_map = path_map
            .into_iter()
            .map(|(label, target)| (label.to_string(), EdgeTarget::from(target)))
            .collect();
        self.edges.push(Edge::Conditional {
            source: source.to_string(),
            router: Arc::new(router),
            path_map,
        });
        self
    }

    pub fn compile(self) -> Result<CompiledGraph> {
        if let Some(name) = self.duplicate_nodes.first() {
            return Err(GraphError::InvalidGraph(format!("node '{}' added twice", name)));
        }
        if let Some(name) = [START, END].into_iter().find(|n| self.nodes.contains_key(*n)) {
            return Err(GraphError::InvalidGraph(format!("'{}' is a reserved node name", name)));
        }

        let entry = match self.entry_points.as_slice() {
            [] => return Err(GraphError::NoEntryPoint),
            [entry] => entry.clone(),
            _ => {
                return Err(GraphError::InvalidGraph(format!(
                    "multiple entry points: {}",
                    self.entry_points.join(", ")
                )))
            },
        };
        if !self.nodes.contains_key(&entry) {
            return Err(GraphError::EdgeTargetNotFound(entry));
        }

        let mut outgoing: HashMap<String, Edge> = HashMap::new();
        for edge in self.edges {
            let source = edge.source().to_string();
            if !self.nodes.contains_key(&source) {
                return Err(GraphError::NodeNotFound(source));
            }
            for target in edge.targets() {
                if let EdgeTarget::Node(name) = target {
                    if !self.nodes.contains_key(name) {
                        return Err(GraphError::EdgeTargetNotFound(name.clone()));
                    }
                }
            }
            if outgoing.insert(source.clone(), edge).is_some() {
                return Err(GraphError::InvalidGraph(format!(
                    "node '{}' has more than one outgoing edge",
                    source
                )));
            }
        }

        let mut names: Vec<&String> = self.nodes.keys().collect();
        names.sort();
        if let Some(name) = names.into_iter().find(|n| !outgoing.contains_key(*n)) {
            return Err(GraphError::InvalidGraph(format!(
                "node '{}' has no outgoing edge",
                name
            )));
        }

        Ok(CompiledGraph {
            schema: self.schema,
            nodes: self.nodes,
            outgoing,
            entry,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        })
    }
}

/// A validated graph ready for execution
pub struct CompiledGraph {
    schema: StateSchema,
    nodes: HashMap<String, Arc<dyn Node>>,
    outgoing: HashMap<String, Edge>,
    entry: String,
    recursion_limit: usize,
}

impl CompiledGraph {
    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// Where to go after `current`; `None` means the run is over
    fn next_node(&self, current: &str, state: &State) -> Result<Option<String>> {
        let edge = self
            .outgoing
            .get(current)
            .ok_or_else(|| GraphError::NodeNotFound(current.to_string()))?;

        let target = match edge {
            Edge::Direct { target, .. } => target.clone(),
            Edge::Conditional { router, path_map, .. } => {
                let route = router(state);
                debug!("Router on {} chose {}", current, route);
                match path_map.get(&route) {
                    Some(target) => target.clone(),
                    None if route == END => EdgeTarget::End,
                    None => {
                        return Err(GraphError::UnknownRoute {
                            node: current.to_string(),
                            route,
                        })
                    },
                }
            },
        };
        Ok(target.node_name().map(str::to_string))
    }

    /// Run the graph, yielding the full state before the first node and after every node
    pub fn stream(&self, input: State) -> impl Stream<Item = Result<State>> + Send + '_ {
        async_stream::stream! {
            let mut state = self.schema.initial_state();
            self.schema.apply(&mut state, input);
            yield Ok(state.clone());

            let mut current = Some(self.entry.clone());
            let mut steps = 0usize;

            while let Some(name) = current {
                if steps >= self.recursion_limit {
                    yield Err(GraphError::RecursionLimitExceeded(self.recursion_limit));
                    return;
                }
                let node = match self.nodes.get(&name) {
                    Some(node) => node.clone(),
                    None => {
                        yield Err(GraphError::NodeNotFound(name));
                        return;
                    }
                };

                debug!("Executing node {} (step {})", name, steps);
                match node.execute(&state).await {
                    Ok(output) => self.schema.apply(&mut state, output.updates),
                    Err(GraphError::Other(source)) => {
                        yield Err(GraphError::NodeFailed { node: name, source });
                        return;
                    }
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
                steps += 1;
                yield Ok(state.clone());

                match self.next_node(&name, &state) {
                    Ok(next) => current = next,
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
            info!("Graph finished after {} node executions", steps);
        }
    }

    /// Run to completion and return the final state
    pub async fn invoke(&self, input: State) -> Result<State> {
        let mut stream = Box::pin(self.stream(input));
        let mut last = State::new();
        while let Some(step) = stream.next().await {
            last = step?;
        }
        Ok(last)
    }
}
