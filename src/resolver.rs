//! Resolving requested script and try-block names into commands.

use crate::command::Command;
use crate::commands::Try;
use crate::config::{Config, NamedScript, TryBlock};
use crate::error::{Error, Result};
use crate::parser::parse_str;
use std::collections::HashMap;

/// Something a user can select by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unit {
    Script(NamedScript),
    Try(TryBlock),
}

impl Unit {
    pub fn name(&self) -> &str {
        match self {
            Self::Script(script) => &script.name,
            Self::Try(block) => &block.name,
        }
    }
}

/// Immutable name → unit mapping built once from a [`Config`].
///
/// Unnamed scripts are called `script1`, `script2`, … by position. Try-block
/// references are validated when the book is built, whether or not the
/// block is ever selected.
#[derive(Debug, Clone)]
pub struct ScriptBook {
    units: Vec<Unit>,
    index: HashMap<String, usize>,
}

impl ScriptBook {
    pub fn new(config: &Config) -> Result<Self> {
        let mut units = Vec::with_capacity(config.scripts.len() + config.tries.len());
        for (i, script) in config.scripts.iter().enumerate() {
            let mut script = script.clone();
            if script.name.is_empty() {
                script.name = format!("script{}", i + 1);
            }
            units.push(Unit::Script(script));
        }
        for block in &config.tries {
            if block.name.is_empty() {
                return Err(Error::Resolution(
                    "try block must have a name attribute".to_string(),
                ));
            }
            units.push(Unit::Try(block.clone()));
        }
        if units.is_empty() {
            return Err(Error::Resolution(
                "no scripts or try blocks found in configuration".to_string(),
            ));
        }

        let mut index = HashMap::with_capacity(units.len());
        for (i, unit) in units.iter().enumerate() {
            if index.insert(unit.name().to_string(), i).is_some() {
                return Err(Error::Resolution(format!(
                    "duplicate script or try block name {:?}",
                    unit.name()
                )));
            }
        }

        let book = Self { units, index };
        for block in config.tries.iter() {
            book.script(&block.script).ok_or_else(|| {
                Error::Resolution(format!(
                    "try block {:?} references non-existent script {:?}",
                    block.name, block.script
                ))
            })?;
            if let Some(except) = block.except_script() {
                book.script(except).ok_or_else(|| {
                    Error::Resolution(format!(
                        "try block {:?} references non-existent except script {except:?}",
                        block.name
                    ))
                })?;
            }
        }
        Ok(book)
    }

    /// Every selectable name, in declaration order.
    pub fn names(&self) -> Vec<&str> {
        self.units.iter().map(Unit::name).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Unit> {
        self.index.get(name).map(|&i| &self.units[i])
    }

    /// A plain script by name; try-blocks do not count.
    pub fn script(&self, name: &str) -> Option<&NamedScript> {
        match self.get(name)? {
            Unit::Script(script) => Some(script),
            Unit::Try(_) => None,
        }
    }

    /// Select units by name, in the order given.
    ///
    /// With no names, selects exactly one unit: the first declared script, or
    /// the first declared try-block when there are no scripts.
    pub fn resolve<S: AsRef<str>>(&self, requested: &[S]) -> Result<Vec<Unit>> {
        if requested.is_empty() {
            let first = self
                .units
                .iter()
                .find(|unit| matches!(unit, Unit::Script(_)))
                .or_else(|| self.units.first());
            return Ok(first.cloned().into_iter().collect());
        }

        requested
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.get(name).cloned().ok_or_else(|| {
                    Error::Resolution(format!(
                        "script or try block {name:?} not found. Available: {}",
                        self.names().join(", ")
                    ))
                })
            })
            .collect()
    }

    /// Parse the selected units into one flat command sequence.
    pub fn compile(&self, units: &[Unit]) -> Result<Vec<Command>> {
        let mut commands = Vec::new();
        for unit in units {
            match unit {
                Unit::Script(script) => commands.extend(self.parse_script(&script.name)?),
                Unit::Try(block) => {
                    let main = self.parse_script(&block.script)?;
                    let except = block
                        .except_script()
                        .map(|name| self.parse_script(name))
                        .transpose()?;
                    commands.push(Try::new(block.clone(), main, except).into());
                }
            }
        }
        Ok(commands)
    }

    fn parse_script(&self, name: &str) -> Result<Vec<Command>> {
        let script = self
            .script(name)
            .ok_or_else(|| Error::Resolution(format!("script {name:?} not found")))?;
        parse_str(&script.body).map_err(|e| Error::Script {
            script: name.to_string(),
            source: Box::new(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use pretty_assertions::assert_eq;

    fn script(name: &str, body: &str) -> NamedScript {
        NamedScript {
            name: name.into(),
            body: body.into(),
        }
    }

    fn block(name: &str, main: &str, except: Option<&str>) -> TryBlock {
        TryBlock {
            name: name.into(),
            script: main.into(),
            except: except.map(str::to_string),
            retry: false,
        }
    }

    fn config(scripts: Vec<NamedScript>, tries: Vec<TryBlock>) -> Config {
        Config {
            scripts,
            tries,
            ..Default::default()
        }
    }

    #[test]
    fn test_unnamed_scripts_get_positional_names() {
        let book = ScriptBook::new(&config(
            vec![script("", "send 'a'"), script("boot", "send 'b'"), script("", "send 'c'")],
            vec![],
        ))
        .unwrap();
        assert_eq!(book.names(), vec!["script1", "boot", "script3"]);
    }

    #[test]
    fn test_default_selection_prefers_first_script() {
        let book = ScriptBook::new(&config(
            vec![script("", "send 'a'"), script("b", "send 'b'")],
            vec![block("t", "b", None)],
        ))
        .unwrap();
        let units = book.resolve::<&str>(&[]).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].name(), "script1");
    }

    #[test]
    fn test_default_selection_falls_back_to_try_block() {
        // A try block needs a script to reference, so build the book by hand.
        let book = ScriptBook {
            units: vec![Unit::Try(block("only", "x", None))],
            index: HashMap::from([("only".to_string(), 0)]),
        };
        let units = book.resolve::<&str>(&[]).unwrap();
        assert_eq!(units, vec![Unit::Try(block("only", "x", None))]);
    }

    #[test]
    fn test_requested_order_is_kept() {
        let book = ScriptBook::new(&config(
            vec![script("a", "send 'a'"), script("b", "send 'b'")],
            vec![block("t", "a", Some("b"))],
        ))
        .unwrap();
        let units = book.resolve(&["t", "b", "a"]).unwrap();
        let names: Vec<_> = units.iter().map(Unit::name).collect();
        assert_eq!(names, vec!["t", "b", "a"]);
    }

    #[test]
    fn test_unknown_name_lists_available() {
        let book = ScriptBook::new(&config(vec![script("a", "send 'a'")], vec![])).unwrap();
        let err = book.resolve(&["a", "missing"]).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Resolution);
        assert!(err.to_string().contains("\"missing\" not found. Available: a"), "got: {err}");
    }

    #[test]
    fn test_dangling_try_references_fail_even_if_unselected() {
        let err = ScriptBook::new(&config(
            vec![script("a", "send 'a'")],
            vec![block("t", "a", Some("gone"))],
        ))
        .unwrap_err();
        assert!(err.to_string().contains("non-existent except script"), "got: {err}");

        let err = ScriptBook::new(&config(vec![script("a", "send 'a'")], vec![block("t", "gone", None)]))
            .unwrap_err();
        assert!(err.to_string().contains("non-existent script"), "got: {err}");
    }

    #[test]
    fn test_try_cannot_reference_try() {
        let err = ScriptBook::new(&config(
            vec![script("a", "send 'a'")],
            vec![block("t1", "a", None), block("t2", "t1", None)],
        ))
        .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Resolution);
    }

    #[test]
    fn test_rejects_unnamed_try_duplicates_and_empty_config() {
        assert!(ScriptBook::new(&config(vec![script("a", "")], vec![block("", "a", None)])).is_err());
        assert!(ScriptBook::new(&config(vec![script("a", ""), script("a", "")], vec![])).is_err());
        assert!(ScriptBook::new(&config(vec![], vec![])).is_err());
    }

    #[test]
    fn test_compile_flattens_scripts_and_wraps_tries() {
        let book = ScriptBook::new(&config(
            vec![script("a", "send 'a'\nexpect 'ok'"), script("b", "monitor 3")],
            vec![block("t", "a", Some("b"))],
        ))
        .unwrap();
        let units = book.resolve(&["a", "t"]).unwrap();
        let commands = book.compile(&units).unwrap();
        let rendered: Vec<_> = commands.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["send 'a'", "expect 'ok'", "try t"]);
        assert!(commands[2].monitors());
    }

    #[test]
    fn test_compile_reports_script_name() {
        let book = ScriptBook::new(&config(vec![script("bad", "send 'a'\nwait 5")], vec![])).unwrap();
        let err = book.compile(&book.resolve(&["bad"]).unwrap()).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Parse);
        assert!(matches!(err, Error::Script { ref script, .. } if script == "bad"));
    }
}
