// SPDX-License-Identifier: GPL-3.0-only

//! Follow-up work returned by message handlers
//!
//! Handlers never sleep, spawn or touch the front end directly. They return
//! a [`Task`] describing what should happen next and the [`Runtime`] carries
//! it out, feeding resulting messages back into `update()`.
//!
//! [`Runtime`]: crate::app::Runtime

use crate::app::state::{HostRequest, Message};
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::time::Duration;

pub enum Task {
    /// Nothing to do
    None,
    /// Deliver a message right away
    Done(Message),
    /// Deliver a message after a delay
    Delay { after: Duration, message: Message },
    /// Run a future and deliver its message
    Perform(BoxFuture<'static, Message>),
    /// Ask the front end to do something
    Host(HostRequest),
    Batch(Vec<Task>),
}

impl Task {
    pub fn none() -> Self {
        Task::None
    }

    pub fn done(message: Message) -> Self {
        Task::Done(message)
    }

    pub fn delay(after: Duration, message: Message) -> Self {
        Task::Delay { after, message }
    }

    pub fn perform<F, T>(future: F, map: impl FnOnce(T) -> Message + Send + 'static) -> Self
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        Task::Perform(Box::pin(async move { map(future.await) }))
    }

    pub fn host(request: HostRequest) -> Self {
        Task::Host(request)
    }

    /// Combine tasks, dropping empty ones
    pub fn batch(tasks: impl IntoIterator<Item = Task>) -> Self {
        let mut tasks: Vec<Task> = tasks
            .into_iter()
            .filter(|task| !matches!(task, Task::None))
            .collect();
        match tasks.len() {
            0 => Task::None,
            1 => tasks.remove(0),
            _ => Task::Batch(tasks),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Task::None)
    }

    /// Flatten nested batches into a list of leaf tasks
    pub fn into_leaves(self) -> Vec<Task> {
        match self {
            Task::None => Vec::new(),
            Task::Batch(tasks) => tasks.into_iter().flat_map(Task::into_leaves).collect(),
            other => vec![other],
        }
    }

    /// Host requests contained in this task, in order
    pub fn host_requests(&self) -> Vec<&HostRequest> {
        match self {
            Task::Host(request) => vec![request],
            Task::Batch(tasks) => tasks.iter().flat_map(Task::host_requests).collect(),
            _ => Vec::new(),
        }
    }

    /// Delayed messages contained in this task, with their delays
    pub fn delayed_messages(&self) -> Vec<(Duration, &Message)> {
        match self {
            Task::Delay { after, message } => vec![(*after, message)],
            Task::Batch(tasks) => tasks.iter().flat_map(Task::delayed_messages).collect(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::None => write!(f, "None"),
            Task::Done(message) => f.debug_tuple("Done").field(message).finish(),
            Task::Delay { after, message } => f
                .debug_struct("Delay")
                .field("after", after)
                .field("message", message)
                .finish(),
            Task::Perform(_) => write!(f, "Perform(..)"),
            Task::Host(request) => f.debug_tuple("Host").field(request).finish(),
            Task::Batch(tasks) => f.debug_list().entries(tasks).finish(),
        }
    }
}
