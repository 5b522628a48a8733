//! REPL session state: a directory of named databases, a map of open
//! engines, and the command dispatcher.
//!
//! Databases are `<data-dir>/<name>.db` files. The engine itself knows
//! nothing about the directory layout; this layer owns opening, closing,
//! and routing queries to the selected database.

use anyhow::{Context, Result, bail};
use common::pretty;
use common::{EngineConfig, ResultRow, RowValue};
use engine::Engine;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

const HELP: &str = "\
Meta-commands:
  .help                     show this help
  .exit                     leave the shell

Database management:
  CREATE DATABASE <name>    create a new database file
  DROP DATABASE <name>      close and delete a database
  USE <name>                select the database queries run against
  SHOW DATABASES            list database files in the data directory
  SHOW NODES | SHOW EDGES   list the selected database's contents
  DESCRIBE DATABASE         counts, labels, and pages
  CLEAR DATABASE            delete all data in the selected database

Anything else is executed as a query, e.g.:
  CREATE (a:Person {name: \"Alice\", age: 30})
  MATCH (n:Person) WHERE n.age = 30 RETURN n";

/// What the caller should do after a handled line.
#[derive(Debug)]
pub enum Outcome {
    Output(String),
    Exit,
}

pub struct Session {
    data_dir: PathBuf,
    config: EngineConfig,
    engines: HashMap<String, Engine>,
    current: Option<String>,
}

impl Session {
    pub fn new(data_dir: PathBuf, config: EngineConfig) -> Result<Self> {
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;
        Ok(Self {
            data_dir,
            config,
            engines: HashMap::new(),
            current: None,
        })
    }

    /// Name of the selected database, for the prompt.
    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Handle one input line: meta-command, admin verb, or query.
    pub fn handle_line(&mut self, line: &str) -> Result<Outcome> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Outcome::Output(String::new()));
        }

        if line.starts_with('.') {
            return match line {
                ".help" => Ok(Outcome::Output(HELP.to_string())),
                ".exit" | ".quit" => Ok(Outcome::Exit),
                other => bail!("unknown meta-command {other}; try .help"),
            };
        }

        let words: Vec<&str> = line.split_whitespace().collect();
        let verb = |i: usize| words.get(i).map(|w| w.to_ascii_uppercase());

        match (verb(0).as_deref(), verb(1).as_deref()) {
            (Some("CREATE"), Some("DATABASE")) => self.create_database(self.arg(&words, 2)?),
            (Some("DROP"), Some("DATABASE")) => self.drop_database(self.arg(&words, 2)?),
            (Some("USE"), _) => self.use_database(self.arg(&words, 1)?),
            (Some("SHOW"), Some("DATABASES")) => self.show_databases(),
            (Some("SHOW"), Some("NODES")) => self.show_nodes(),
            (Some("SHOW"), Some("EDGES")) => self.show_edges(),
            (Some("DESCRIBE"), Some("DATABASE")) => self.describe_database(),
            (Some("CLEAR"), Some("DATABASE")) => self.clear_database(),
            _ => self.run_query(line),
        }
    }

    /// Close every open engine. Called once on shell exit.
    pub fn close_all(&mut self) -> Result<()> {
        for (name, engine) in self.engines.drain() {
            engine
                .close()
                .with_context(|| format!("failed to close database '{name}'"))?;
        }
        self.current = None;
        Ok(())
    }

    fn arg<'a>(&self, words: &[&'a str], index: usize) -> Result<&'a str> {
        let name = words
            .get(index)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("expected a database name; try .help"))?;
        if words.len() > index + 1 {
            bail!("unexpected trailing input after '{name}'");
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            bail!("database names may only contain letters, digits, '_' and '-'");
        }
        Ok(name)
    }

    fn db_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{name}.db"))
    }

    fn create_database(&mut self, name: &str) -> Result<Outcome> {
        let path = self.db_path(name);
        if path.exists() {
            bail!("database '{name}' already exists");
        }
        let engine = Engine::open(&path, self.config.clone())?;
        self.engines.insert(name.to_string(), engine);
        Ok(Outcome::Output(format!("Created database '{name}'.")))
    }

    fn drop_database(&mut self, name: &str) -> Result<Outcome> {
        if let Some(engine) = self.engines.remove(name) {
            engine.close()?;
        }
        if self.current.as_deref() == Some(name) {
            self.current = None;
        }

        let path = self.db_path(name);
        if !path.exists() {
            bail!("database '{name}' does not exist");
        }
        fs::remove_file(&path)
            .with_context(|| format!("failed to remove {}", path.display()))?;
        Ok(Outcome::Output(format!("Dropped database '{name}'.")))
    }

    fn use_database(&mut self, name: &str) -> Result<Outcome> {
        if !self.engines.contains_key(name) {
            let path = self.db_path(name);
            if !path.exists() {
                bail!("database '{name}' does not exist; CREATE DATABASE {name} first");
            }
            let engine = Engine::open(&path, self.config.clone())?;
            self.engines.insert(name.to_string(), engine);
        }
        self.current = Some(name.to_string());
        Ok(Outcome::Output(format!("Using database '{name}'.")))
    }

    fn show_databases(&self) -> Result<Outcome> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.data_dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "db") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();

        let rows = names
            .into_iter()
            .map(|name| {
                let marker = if self.current.as_deref() == Some(&*name) {
                    "current"
                } else {
                    ""
                };
                vec![name, marker.to_string()]
            })
            .collect();
        Ok(Outcome::Output(pretty::render_string_table(
            &["database", ""],
            rows,
        )))
    }

    fn show_nodes(&mut self) -> Result<Outcome> {
        let engine = self.selected()?;
        let rows: Vec<ResultRow> = engine
            .nodes()?
            .iter()
            .map(|node| ResultRow::new("n", RowValue::from(node)))
            .collect();
        Ok(Outcome::Output(pretty::render_rows(&rows)))
    }

    fn show_edges(&mut self) -> Result<Outcome> {
        let engine = self.selected()?;
        let rows: Vec<ResultRow> = engine
            .edges()?
            .iter()
            .map(|edge| ResultRow::new("e", RowValue::from(edge)))
            .collect();
        Ok(Outcome::Output(pretty::render_rows(&rows)))
    }

    fn describe_database(&mut self) -> Result<Outcome> {
        let engine = self.selected()?;
        let rows = vec![
            vec!["nodes".to_string(), engine.node_count().to_string()],
            vec!["edges".to_string(), engine.edge_count().to_string()],
            vec!["labels".to_string(), engine.labels().join(", ")],
            vec!["pages".to_string(), engine.page_count().to_string()],
        ];
        Ok(Outcome::Output(pretty::render_string_table(
            &["property", "value"],
            rows,
        )))
    }

    /// Deleting and recreating the file is the whole implementation: the
    /// engine has no truncate operation.
    fn clear_database(&mut self) -> Result<Outcome> {
        let name = self
            .current
            .clone()
            .ok_or_else(|| anyhow::anyhow!("no database selected; USE <name> first"))?;

        if let Some(engine) = self.engines.remove(&name) {
            engine.close()?;
        }
        let path = self.db_path(&name);
        fs::remove_file(&path)
            .with_context(|| format!("failed to remove {}", path.display()))?;
        let engine = Engine::open(&path, self.config.clone())?;
        self.engines.insert(name.clone(), engine);
        Ok(Outcome::Output(format!("Cleared database '{name}'.")))
    }

    fn run_query(&mut self, query: &str) -> Result<Outcome> {
        let engine = self.selected()?;
        let rows = engine.execute(query)?;
        if rows.is_empty() {
            return Ok(Outcome::Output("OK".to_string()));
        }
        let table = pretty::render_rows(&rows);
        Ok(Outcome::Output(format!("{table}\n{} row(s)", rows.len())))
    }

    fn selected(&mut self) -> Result<&mut Engine> {
        let name = self
            .current
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("no database selected; USE <name> first"))?;
        self.engines
            .get_mut(name)
            .ok_or_else(|| anyhow::anyhow!("database '{name}' is not open"))
    }
}
