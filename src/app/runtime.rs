// SPDX-License-Identifier: GPL-3.0-only

//! Executes the [`Task`]s returned by `update()`
//!
//! ```text
//!  front end ──dispatch──▶ AppModel::update ──Task──▶ Runtime
//!      ▲                                              │
//!      │ HostRequest            delays / futures ─────┤
//!      └──────────── Host ◀──────────────────────────┘
//!                        messages come back through next_message()
//! ```

use crate::app::state::{AppModel, HostRequest, Message};
use crate::app::task::Task;
use crate::backends::preview::PreviewEventReceiver;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Whatever presents the controller: shows notices, closes the screen
pub trait Host {
    fn handle(&mut self, request: HostRequest);
}

pub struct Runtime {
    model: AppModel,
    sender: UnboundedSender<Message>,
    receiver: UnboundedReceiver<Message>,
    /// Futures whose results are still outstanding
    background: Vec<JoinHandle<()>>,
}

impl Runtime {
    pub fn new(model: AppModel) -> Self {
        let (sender, receiver) = unbounded_channel();
        Self {
            model,
            sender,
            receiver,
            background: Vec::new(),
        }
    }

    pub fn model(&self) -> &AppModel {
        &self.model
    }

    /// Sender for messages produced outside the runtime
    pub fn sender(&self) -> UnboundedSender<Message> {
        self.sender.clone()
    }

    /// Run `message` through the controller and carry out the resulting work
    ///
    /// Immediate follow-up messages are handled before this returns. Delays
    /// and futures are spawned and report back through [`Runtime::next_message`].
    /// Must be called from within a tokio runtime.
    pub fn dispatch(&mut self, message: Message, host: &mut dyn Host) {
        let mut queue = VecDeque::from([message]);
        while let Some(message) = queue.pop_front() {
            let task = self.model.update(message);
            for leaf in task.into_leaves() {
                match leaf {
                    Task::Done(message) => queue.push_back(message),
                    Task::Delay { after, message } => {
                        let sender = self.sender.clone();
                        tokio::spawn(async move {
                            tokio::time::sleep(after).await;
                            let _ = sender.send(message);
                        });
                    }
                    Task::Perform(future) => {
                        let sender = self.sender.clone();
                        self.background.push(tokio::spawn(async move {
                            let _ = sender.send(future.await);
                        }));
                    }
                    Task::Host(request) => host.handle(request),
                    Task::None | Task::Batch(_) => {}
                }
            }
        }
        self.background.retain(|handle| !handle.is_finished());
    }

    /// Next message from a timer, background work or a forwarded source
    pub async fn next_message(&mut self) -> Option<Message> {
        self.receiver.recv().await
    }

    /// Feed preview callbacks into the message stream
    pub fn forward_preview_events(&self, mut events: PreviewEventReceiver) {
        let sender = self.sender.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if sender.send(Message::Preview(event)).is_err() {
                    break;
                }
            }
            debug!("Preview event stream closed");
        });
    }

    /// Feed accelerometer samples into the message stream
    pub fn forward_samples(&self, mut samples: UnboundedReceiver<f32>) {
        let sender = self.sender.clone();
        tokio::spawn(async move {
            while let Some(x) = samples.recv().await {
                if sender.send(Message::AccelerometerSample(x)).is_err() {
                    break;
                }
            }
        });
    }

    /// Wait for outstanding background work, such as a media scan, to finish
    pub async fn drain(&mut self, timeout: Duration) {
        let pending = std::mem::take(&mut self.background);
        let wait = futures::future::join_all(pending);
        if tokio::time::timeout(timeout, wait).await.is_err() {
            warn!("Background work still running at shutdown");
        }
    }
}
