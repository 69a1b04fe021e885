//! The routing trie.
//!
//! Each node stands for one path segment under one HTTP method. A node has
//! any number of literal children, keyed by exact segment text, and at most
//! one wildcard child that matches any single segment. Wildcard segments
//! never become literal keys, so the two kinds of edge cannot collide.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Result, RouterError};
use crate::middleware::{Handler, Middleware};
use crate::path;
use crate::request::Method;

/// What a registration leaves at its terminal node.
pub(crate) struct Endpoint {
    /// Middlewares attached to this one registration, in call order.
    pub(crate) middlewares: Vec<Arc<dyn Middleware>>,
    /// The composed chain: group middlewares, route middlewares, endpoint.
    pub(crate) chain: Handler,
}

#[derive(Default)]
pub(crate) struct Node {
    children: HashMap<String, Node>,
    wildcard: Option<Box<Node>>,
    /// Parameter name captured by this node, when it is a wildcard child.
    param: Option<String>,
    /// Wildcard names from the method root down to this node, in order.
    names: Vec<String>,
    endpoint: Option<Endpoint>,
}

enum Segment<'a> {
    Literal(&'a str),
    Wildcard(&'a str),
}

fn parse(method: Method, path: &str) -> Result<Vec<Segment<'_>>> {
    if path::has_empty_segment(path) {
        return Err(RouterError::EmptySegment {
            method,
            path: path.to_string(),
        });
    }

    let mut tokens = Vec::new();
    path::split(path, &mut tokens);
    let mut seen: Vec<&str> = Vec::new();
    tokens
        .into_iter()
        .map(|token| match path::wildcard_name(token) {
            Some("") => Err(RouterError::InvalidWildcard {
                method,
                path: path.to_string(),
            }),
            Some(name) if seen.contains(&name) => Err(RouterError::DuplicateWildcard {
                method,
                path: path.to_string(),
                name: name.to_string(),
            }),
            Some(name) => {
                seen.push(name);
                Ok(Segment::Wildcard(name))
            }
            None => Ok(Segment::Literal(token)),
        })
        .collect()
}

impl Node {
    /// Registers `endpoint` at `path`.
    ///
    /// On error the trie is left exactly as it was.
    pub(crate) fn insert(&mut self, method: Method, path: &str, endpoint: Endpoint) -> Result<()> {
        let segments = parse(method, path)?;
        self.check(method, path, &segments)?;

        let mut node = self;
        for segment in &segments {
            node = match *segment {
                Segment::Literal(text) => {
                    let names = &node.names;
                    node.children
                        .entry(text.to_string())
                        .or_insert_with(|| Node {
                            names: names.clone(),
                            ..Node::default()
                        })
                }
                Segment::Wildcard(name) => {
                    let names = &node.names;
                    let wild = node.wildcard.get_or_insert_with(|| {
                        let mut child_names = names.clone();
                        child_names.push(name.to_string());
                        Box::new(Node {
                            param: Some(name.to_string()),
                            names: child_names,
                            ..Node::default()
                        })
                    });
                    &mut **wild
                }
            };
        }
        node.endpoint = Some(endpoint);
        Ok(())
    }

    /// Walks the existing part of the trie along `segments` looking for a
    /// wildcard name mismatch or an already-handled terminal node.
    fn check(&self, method: Method, path: &str, segments: &[Segment<'_>]) -> Result<()> {
        let mut node = self;
        for segment in segments {
            let next = match *segment {
                Segment::Literal(text) => node.children.get(text),
                Segment::Wildcard(name) => match &node.wildcard {
                    Some(wild) if wild.param.as_deref() != Some(name) => {
                        return Err(RouterError::WildcardMismatch {
                            method,
                            path: path.to_string(),
                            existing: wild.param.clone().unwrap_or_default(),
                            found: name.to_string(),
                        });
                    }
                    wild => wild.as_deref(),
                },
            };
            match next {
                Some(child) => node = child,
                // The rest of the path is new, nothing left to collide with.
                None => return Ok(()),
            }
        }

        if node.endpoint.is_some() {
            return Err(RouterError::DuplicateRoute {
                method,
                path: path.to_string(),
            });
        }
        Ok(())
    }

    /// Finds the node terminating `tokens`, pushing wildcard captures onto
    /// `values`.
    ///
    /// Literal children are tried before the wildcard; when a literal branch
    /// dead-ends deeper down, the search backs up and tries the wildcard.
    pub(crate) fn find<'n, 'p>(
        &'n self,
        tokens: &[&'p str],
        values: &mut Vec<&'p str>,
    ) -> Option<&'n Node> {
        let Some((&token, rest)) = tokens.split_first() else {
            return self.endpoint.is_some().then_some(self);
        };

        if let Some(found) = self
            .children
            .get(token)
            .and_then(|child| child.find(rest, values))
        {
            return Some(found);
        }

        let wild = self.wildcard.as_deref()?;
        values.push(token);
        let found = wild.find(rest, values);
        if found.is_none() {
            values.pop();
        }
        found
    }

    pub(crate) fn names(&self) -> &[String] {
        &self.names
    }

    pub(crate) fn endpoint(&self) -> Option<&Endpoint> {
        self.endpoint.as_ref()
    }

    /// Collects the path and route-level middleware count of every handled
    /// node below this one. Wildcards render as `:name`.
    pub(crate) fn collect_routes(&self, prefix: &str, out: &mut Vec<(String, usize)>) {
        if let Some(endpoint) = &self.endpoint {
            let path = if prefix.is_empty() { "/" } else { prefix };
            out.push((path.to_string(), endpoint.middlewares.len()));
        }
        for (segment, child) in &self.children {
            child.collect_routes(&format!("{prefix}/{segment}"), out);
        }
        if let Some(wild) = &self.wildcard {
            let name = wild.param.as_deref().unwrap_or_default();
            wild.collect_routes(&format!("{prefix}/:{name}"), out);
        }
    }
}
