use crate::ast::{
    FlatMap, OverrideValue, RawToken, RawValue, ResolvedToken, TokenDocument, TokenType,
    TokenValue,
};
use crate::error::ResolverError;
use crate::parser::decode_literal;
use crate::utils::{to_dot_path, SEGMENT_DELIMITER};
use indexmap::IndexMap;
use std::collections::HashMap;

// A token in the merged namespace, with the file it came from
struct SourceToken<'d> {
    name: &'d str,
    file: String,
    token: &'d RawToken,
}

/// Merges parsed documents into one namespace and resolves every alias in it.
pub struct Resolver<'d> {
    // Every token of every document, keyed by dot path, in document order
    namespace: IndexMap<String, SourceToken<'d>>,
    // Concrete default value and type per dot path, filled in as chains are walked
    resolved: HashMap<String, (TokenValue, TokenType)>,
    // Dot paths currently being resolved, to detect circular aliases
    resolving_stack: Vec<String>,
}

impl<'d> Resolver<'d> {
    /// Builds the merged namespace. `documents` is expected in dependency
    /// order, as produced by [`crate::loader::load_documents`].
    pub fn new(documents: &'d [TokenDocument]) -> Result<Self, ResolverError> {
        let mut namespace: IndexMap<String, SourceToken<'d>> = IndexMap::new();
        for document in documents {
            let file = document.path.to_string_lossy().to_string();
            for (name, token) in &document.props {
                let path = to_dot_path(name);
                if let Some(existing) = namespace.get(&path) {
                    return Err(ResolverError::DuplicateToken {
                        token: path,
                        first: existing.file.clone(),
                        second: file,
                    });
                }
                namespace.insert(
                    path,
                    SourceToken {
                        name,
                        file: file.clone(),
                        token,
                    },
                );
            }
        }
        Ok(Resolver {
            namespace,
            resolved: HashMap::new(),
            resolving_stack: Vec::new(),
        })
    }

    /// Resolves every token into the flat map, in namespace order.
    pub fn resolve(mut self) -> Result<FlatMap, ResolverError> {
        let paths: Vec<String> = self.namespace.keys().cloned().collect();
        let mut tokens = FlatMap::with_capacity(paths.len());

        for path in paths {
            let (value, kind) = self.resolve_base(&path)?;
            let entry = &self.namespace[&path];
            let (name, file, token) = (entry.name, entry.file.clone(), entry.token);

            let alias_of = match &token.value {
                RawValue::Alias(reference) => Some(self.lookup(&path, reference, &file)?),
                RawValue::Literal(_) | RawValue::Pending(_) => None,
            };
            let theme_values = self.resolve_overrides(&path, &file, kind, &token.themes)?;
            let breakpoint_values =
                self.resolve_overrides(&path, &file, kind, &token.breakpoints)?;

            tokens.insert(
                path.clone(),
                ResolvedToken {
                    path,
                    raw_path: name.split(SEGMENT_DELIMITER).map(str::to_string).collect(),
                    value,
                    kind,
                    alias_of,
                    description: token.description.clone(),
                    category: token.category.clone(),
                    theme_values,
                    breakpoint_values,
                },
            );
        }

        log::debug!("resolved {} tokens", tokens.len());
        Ok(tokens)
    }

    // Walks the alias chain starting at `path` down to a literal
    fn resolve_base(&mut self, path: &str) -> Result<(TokenValue, TokenType), ResolverError> {
        if let Some(done) = self.resolved.get(path) {
            return Ok(done.clone());
        }
        if self.resolving_stack.iter().any(|p| p == path) {
            return Err(self.circular_reference(path));
        }
        let entry = self
            .namespace
            .get(path)
            .ok_or_else(|| ResolverError::UnknownReference {
                token: path.to_string(),
                reference: path.to_string(),
                file: String::new(),
            })?;
        let (file, token) = (entry.file.clone(), entry.token);

        self.resolving_stack.push(path.to_string());
        let result = match (&token.value, token.kind) {
            (RawValue::Literal(value), Some(kind)) => (value.clone(), kind),
            (RawValue::Literal(_) | RawValue::Pending(_), _) => {
                return Err(ResolverError::MissingType {
                    token: path.to_string(),
                    file,
                })
            }
            (RawValue::Alias(reference), declared) => {
                let target = self.lookup(path, reference, &file)?;
                let (value, kind) = self.resolve_base(&target)?;
                if let Some(declared) = declared {
                    if declared != kind {
                        return Err(ResolverError::TypeMismatch {
                            token: path.to_string(),
                            reference: target,
                            declared: declared.to_string(),
                            found: kind.to_string(),
                        });
                    }
                }
                (value, kind)
            }
        };
        self.resolving_stack.pop();

        self.resolved.insert(path.to_string(), result.clone());
        Ok(result)
    }

    fn resolve_overrides(
        &mut self,
        path: &str,
        file: &str,
        kind: TokenType,
        overrides: &'d IndexMap<String, RawValue>,
    ) -> Result<IndexMap<String, OverrideValue>, ResolverError> {
        let mut resolved = IndexMap::with_capacity(overrides.len());
        for (scope, raw) in overrides {
            let value = match raw {
                RawValue::Literal(value) => OverrideValue {
                    value: value.clone(),
                    alias_of: None,
                },
                RawValue::Pending(raw) => OverrideValue {
                    value: decode_literal(kind, raw).map_err(|err| {
                        ResolverError::InvalidOverride {
                            file: file.to_string(),
                            token: format!("{path} ({scope})"),
                            kind: kind.to_string(),
                            reason: err.to_string(),
                        }
                    })?,
                    alias_of: None,
                },
                RawValue::Alias(reference) => {
                    let target = self.lookup(path, reference, file)?;
                    let (value, target_kind) = self.resolve_base(&target)?;
                    if target_kind != kind {
                        return Err(ResolverError::TypeMismatch {
                            token: format!("{path} ({scope})"),
                            reference: target,
                            declared: kind.to_string(),
                            found: target_kind.to_string(),
                        });
                    }
                    // An override may not lead back to the token it overrides.
                    if let Some(cycle) = self.chain_through(&target, path) {
                        return Err(ResolverError::CircularReference {
                            cycle: format!("{path} ({scope}) -> {cycle}"),
                        });
                    }
                    OverrideValue {
                        value,
                        alias_of: Some(target),
                    }
                }
            };
            resolved.insert(scope.clone(), value);
        }
        Ok(resolved)
    }

    // Follows default aliases from `start`; returns the chain if it reaches `needle`
    fn chain_through(&self, start: &str, needle: &str) -> Option<String> {
        let mut chain = vec![start.to_string()];
        let mut current = start.to_string();
        while current != needle {
            match &self.namespace.get(&current)?.token.value {
                RawValue::Alias(reference) => current = to_dot_path(reference),
                RawValue::Literal(_) | RawValue::Pending(_) => return None,
            }
            chain.push(current.clone());
        }
        Some(chain.join(" -> "))
    }

    fn lookup(&self, from: &str, reference: &str, file: &str) -> Result<String, ResolverError> {
        let target = to_dot_path(reference);
        if self.namespace.contains_key(&target) {
            Ok(target)
        } else {
            Err(ResolverError::UnknownReference {
                token: from.to_string(),
                reference: reference.to_string(),
                file: file.to_string(),
            })
        }
    }

    fn circular_reference(&self, path: &str) -> ResolverError {
        let cycle = self
            .resolving_stack
            .iter()
            .skip_while(|p| *p != path)
            .map(String::as_str)
            .chain(std::iter::once(path))
            .collect::<Vec<_>>()
            .join(" -> ");
        ResolverError::CircularReference { cycle }
    }
}

/// Merges `documents` and resolves them into a flat map.
pub fn resolve_documents(documents: &[TokenDocument]) -> Result<FlatMap, ResolverError> {
    Resolver::new(documents)?.resolve()
}

/// Re-walks the `aliasOf` links of an already resolved map, copying each
/// target's concrete value again. A consistent map comes back unchanged;
/// dangling links and cycles are still reported.
pub fn relink(tokens: &FlatMap) -> Result<FlatMap, ResolverError> {
    let mut relinked = FlatMap::with_capacity(tokens.len());
    for (path, token) in tokens {
        let mut token = token.clone();
        if let Some(target) = &token.alias_of {
            token.value = concrete_value(tokens, path, target)?;
        }
        for value in token
            .theme_values
            .values_mut()
            .chain(token.breakpoint_values.values_mut())
        {
            if let Some(target) = &value.alias_of {
                value.value = concrete_value(tokens, path, target)?;
            }
        }
        relinked.insert(path.clone(), token);
    }
    Ok(relinked)
}

fn concrete_value(tokens: &FlatMap, from: &str, target: &str) -> Result<TokenValue, ResolverError> {
    let mut chain = vec![from];
    let mut current = target;
    loop {
        if chain.contains(&current) {
            chain.push(current);
            return Err(ResolverError::CircularReference {
                cycle: chain.join(" -> "),
            });
        }
        let token = tokens
            .get(current)
            .ok_or_else(|| ResolverError::UnknownReference {
                token: from.to_string(),
                reference: current.to_string(),
                file: "resolved tokens".to_string(),
            })?;
        chain.push(current);
        match &token.alias_of {
            Some(next) => current = next.as_str(),
            None => return Ok(token.value.clone()),
        }
    }
}
