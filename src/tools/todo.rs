//! To-do list tools

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use tokio::sync::Mutex;

use crate::agent::Context;

use super::{success, Arguments, Parameter, Tool, ToolError, ToolResult, Toolkit};

const ITEM: Parameter = Parameter::string("item", "The item in the to do list to mark");

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TodoItem {
    pub item: String,
    pub completed: bool,
}

/// In-memory, insertion-ordered to-do list shared by the toolkit's tools
#[derive(Debug, Clone, Default)]
pub struct TodoList {
    items: Arc<Mutex<Vec<TodoItem>>>,
}

impl TodoList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item; an existing item is reset to not completed
    pub async fn add(&self, item: &str) {
        let mut items = self.items.lock().await;
        match items.iter_mut().find(|t| t.item == item) {
            Some(existing) => existing.completed = false,
            None => items.push(TodoItem {
                item: item.to_string(),
                completed: false,
            }),
        }
    }

    /// Remove an item, returns false if it was not on the list
    pub async fn remove(&self, item: &str) -> bool {
        let mut items = self.items.lock().await;
        let before = items.len();
        items.retain(|t| t.item != item);
        items.len() != before
    }

    /// Mark an item, returns false if it was not on the list
    pub async fn mark(&self, item: &str, completed: bool) -> bool {
        let mut items = self.items.lock().await;
        match items.iter_mut().find(|t| t.item == item) {
            Some(existing) => {
                existing.completed = completed;
                true
            }
            None => false,
        }
    }

    /// Item names filtered by completion state, in insertion order
    pub async fn items(&self, completed: bool) -> Vec<String> {
        self.items
            .lock()
            .await
            .iter()
            .filter(|t| t.completed == completed)
            .map(|t| t.item.clone())
            .collect()
    }

    pub async fn snapshot(&self) -> Vec<TodoItem> {
        self.items.lock().await.clone()
    }
}

pub struct AddItemTool {
    list: TodoList,
}

#[async_trait]
impl Tool for AddItemTool {
    fn name(&self) -> &str { "add_item_to_to_do_list" }

    fn description(&self) -> &str {
        "Adds an item to the to do list. \
         NOTE: Only use this tool if the user explicitely asks for a to do item to be added."
    }

    fn parameters(&self) -> &[Parameter] {
        const PARAMS: &[Parameter] = &[Parameter::string("item", "The item to add to the to do list")];
        PARAMS
    }

    async fn execute(&self, args: Arguments, _ctx: &Context) -> ToolResult {
        let item = args.str("item").trim();
        if item.is_empty() {
            return Err(ToolError::new(self.name(), "No item provided."));
        }

        self.list.add(item).await;
        Ok(success(self.name()))
    }
}

pub struct RemoveItemTool {
    list: TodoList,
}

#[async_trait]
impl Tool for RemoveItemTool {
    fn name(&self) -> &str { "remove_items_from_to_do_list" }

    fn description(&self) -> &str {
        "Removes an item from the to do list if it exists. \
         NOTE: Only use this tool if the user explicitely asks for a to do item to be removed."
    }

    fn parameters(&self) -> &[Parameter] {
        const PARAMS: &[Parameter] = &[Parameter::string("item", "The item to remove from the to do list")];
        PARAMS
    }

    async fn execute(&self, args: Arguments, _ctx: &Context) -> ToolResult {
        let item = args.str("item").trim();
        if !self.list.remove(item).await {
            return Err(ToolError::new(
                self.name(),
                format!("Item '{item}' is not on the to do list."),
            ));
        }
        Ok(success(self.name()))
    }
}

pub struct MarkItemTool {
    list: TodoList,
}

#[async_trait]
impl Tool for MarkItemTool {
    fn name(&self) -> &str { "mark_to_do_item" }

    fn description(&self) -> &str {
        "Marks a to do item as completed or not completed. \
         NOTE: Only use this tool if the user explicitely asks for a to do item to be marked."
    }

    fn parameters(&self) -> &[Parameter] {
        const PARAMS: &[Parameter] = &[
            ITEM,
            Parameter::boolean("completed", "Whether the item is completed"),
        ];
        PARAMS
    }

    async fn execute(&self, args: Arguments, _ctx: &Context) -> ToolResult {
        let item = args.str("item").trim();
        let completed = args.bool("completed").unwrap_or(false);

        if !self.list.mark(item, completed).await {
            return Err(ToolError::new(
                self.name(),
                format!("Item '{item}' is not on the to do list."),
            ));
        }
        Ok(success(self.name()))
    }
}

/// Lists done or remaining items
pub struct ListItemsTool {
    list: TodoList,
    completed: bool,
}

#[async_trait]
impl Tool for ListItemsTool {
    fn name(&self) -> &str {
        if self.completed {
            "get_to_do_done_items"
        } else {
            "get_to_do_list_remaining_items"
        }
    }

    fn description(&self) -> &str {
        if self.completed {
            "Gets the user's to do list items that have been completed. \
             NOTE: Only use this tool if the user explicitely asks for the done to do list items."
        } else {
            "Gets the user's to do list items that still haven't been completed. \
             NOTE: Only use this tool if the user explicitely asks for the remaining to do list items."
        }
    }

    async fn execute(&self, _args: Arguments, _ctx: &Context) -> ToolResult {
        Ok(json!(self.list.items(self.completed).await))
    }
}

pub fn toolkit(list: TodoList) -> Toolkit {
    Toolkit::new("to_do_list")
        .with(AddItemTool { list: list.clone() })
        .with(RemoveItemTool { list: list.clone() })
        .with(MarkItemTool { list: list.clone() })
        .with(ListItemsTool { list: list.clone(), completed: true })
        .with(ListItemsTool { list, completed: false })
}
