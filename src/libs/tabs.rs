use std::fmt;
use tracing::debug;

use crate::libs::error::{CrudError, CrudResult};
use crate::libs::executor::{Backend, CrudExecutor};
use crate::libs::form::{CrudAction, Form};
use crate::libs::schema::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A message for the user after an action, shown modally by the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: &'static str,
    pub message: String,
}

impl Notice {
    fn success(message: &str) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: "Success",
            message: message.to_string(),
        }
    }

    fn error(message: String) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: "Error",
            message,
        }
    }

    fn failure(action: CrudAction, err: &CrudError) -> Self {
        match action {
            CrudAction::Create => Self::error(format!("Failed to create entry: {}", err)),
            CrudAction::Delete => Self::error(format!("Failed to delete entry: {}", err)),
            CrudAction::Read | CrudAction::Update => Self::error(err.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.title, self.message)
    }
}

pub struct Tab {
    pub title: &'static str,
    pub form: Form,
}

/// One tab per table, all sharing a single executor and its connection.
pub struct TabSet<B> {
    executor: CrudExecutor<B>,
    tabs: Vec<Tab>,
}

impl<B: Backend> TabSet<B> {
    pub fn new(backend: B) -> Self {
        let tabs = Table::ALL
            .into_iter()
            .map(|table| Tab {
                title: table.title(),
                form: Form::build(table),
            })
            .collect();
        Self {
            executor: CrudExecutor::new(backend),
            tabs,
        }
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    fn index(table: Table) -> usize {
        Table::ALL
            .iter()
            .position(|t| *t == table)
            .unwrap_or_default()
    }

    pub fn form(&self, table: Table) -> &Form {
        &self.tabs[Self::index(table)].form
    }

    pub fn form_mut(&mut self, table: Table) -> &mut Form {
        &mut self.tabs[Self::index(table)].form
    }

    pub fn executor(&self) -> &CrudExecutor<B> {
        &self.executor
    }

    pub fn into_backend(self) -> B {
        self.executor.into_inner()
    }

    /// Runs a button's action for one tab and refreshes its grid after a
    /// successful write. Returns the notice to show, if any.
    pub async fn trigger(&mut self, table: Table, action: CrudAction) -> Option<Notice> {
        let snapshot = self.form(table).state.snapshot();
        debug!(%table, ?action, "trigger");

        let written = match action {
            CrudAction::Read => return self.refresh(table).await.err(),
            CrudAction::Create => self.executor.create(&snapshot).await,
            CrudAction::Update => self.executor.update(&snapshot).await,
            CrudAction::Delete => self.executor.delete(&snapshot).await,
        };
        if let Err(e) = written {
            return Some(Notice::failure(action, &e));
        }

        // The success notice comes first; a failed refresh replaces it.
        let notice = Notice::success(match action {
            CrudAction::Create => "Entry created successfully",
            CrudAction::Update => "Entry updated successfully",
            _ => "Entry deleted successfully",
        });
        match self.refresh(table).await {
            Ok(()) => Some(notice),
            Err(refresh_failed) => Some(refresh_failed),
        }
    }

    async fn refresh(&mut self, table: Table) -> Result<(), Notice> {
        let rows = self
            .executor
            .read(table)
            .await
            .map_err(|e| Notice::failure(CrudAction::Read, &e))?;
        self.form_mut(table).grid.replace_rows(rows);
        Ok(())
    }

    /// Sets one input of a tab's form.
    pub fn set_input(&mut self, table: Table, field: &str, text: &str) -> CrudResult<()> {
        self.form_mut(table).state.set(field, text)
    }
}
