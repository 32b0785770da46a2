//! tidylist - task state management for a personal to-do app
//!
//! This library owns the task list of a to-do application: task CRUD, drag
//! reordering, due-date reminders, automatic removal of old completed tasks,
//! local persistence and best-effort mirroring to a per-user cloud collection.
//!
//! # Modules
//!
//! * [`store`] - The task store, entry point for every mutation
//! * [`entities`] - Task, patch and user data models
//! * [`retention`] - Retention policy for completed tasks
//! * [`scheduling`] - Due-date reminders and calendar events
//! * [`remote`] - Remote document store abstraction
//! * [`sync`] - Outbox and worker mirroring mutations to the remote store
//! * [`storage`] - Versioned local persistence
//! * [`auth`] - Push-based signed-in identity
//! * [`query`] - Filtering and progress
//! * [`config`] - Application configuration management
//! * [`logger`] - Logging setup and diagnostic buffer

/// Push-based identity source
pub mod auth;

/// Configuration module for managing application settings
pub mod config;

/// Application constants and default values
pub mod constants;

/// Task and user models
pub mod entities;

/// Logging utilities for diagnostics and error tracking
pub mod logger;

/// Filtering and progress over the task list
pub mod query;

/// Remote document store abstraction
pub mod remote;

/// Retention policy for completed tasks
pub mod retention;

/// Notification and calendar side effects
pub mod scheduling;

/// Local persistence of the store state
pub mod storage;

/// The task store
pub mod store;

/// Outbox-based remote mirroring
pub mod sync;

/// Utility functions for date/time handling
pub mod utils;

pub use entities::{NewTask, Priority, Task, TaskPatch, User};
pub use store::{StoreOptions, TaskStore};
