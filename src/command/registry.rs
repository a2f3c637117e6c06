/// Ordered name -> command mapping with an alias index
use crate::{
    command::Command,
    error::{BotError, BotResult},
};
use std::collections::HashMap;
use std::sync::Arc;

/// Commands in registration order, indexed by name and alias.
///
/// A name or alias resolves to at most one command.
#[derive(Default)]
pub struct Registry {
    commands: Vec<Arc<Command>>,
    names: HashMap<String, usize>,
    /// alias -> command name, rebuilt on every registration
    aliases: HashMap<String, String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a command, rejecting any name or alias already in use
    pub fn register(&mut self, command: Command) -> BotResult<Arc<Command>> {
        let mut keys = vec![command.name.as_str()];
        keys.extend(command.aliases.iter().map(String::as_str));

        for (i, key) in keys.iter().enumerate() {
            if self.is_taken(key) || keys[..i].contains(key) {
                return Err(BotError::DuplicateName(key.to_string()));
            }
        }

        let command = Arc::new(command);
        self.names.insert(command.name.clone(), self.commands.len());
        self.commands.push(Arc::clone(&command));
        self.rebuild_aliases();

        Ok(command)
    }

    fn is_taken(&self, key: &str) -> bool {
        self.names.contains_key(key) || self.aliases.contains_key(key)
    }

    fn rebuild_aliases(&mut self) {
        self.aliases = self
            .commands
            .iter()
            .flat_map(|command| {
                command
                    .aliases
                    .iter()
                    .map(move |alias| (alias.clone(), command.name.clone()))
            })
            .collect();
    }

    /// Case-insensitive lookup by name, then by alias
    pub fn get(&self, token: &str) -> Option<&Arc<Command>> {
        let token = token.to_lowercase();
        let index = match self.names.get(&token) {
            Some(&index) => index,
            None => *self.names.get(self.aliases.get(&token)?)?,
        };
        self.commands.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Command>> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
