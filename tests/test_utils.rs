#![allow(dead_code)]

use nice_tools::writers::{ChatId, Transport, TransportError};
use std::{
    path::Path,
    sync::{Arc, Mutex},
};

const CTRL_INDEX: &str = "CTRL_INDEX";

// launch child process from same executable and sets there an additional environment variable
// or finds this environment variable and returns its value
pub fn dispatch(count: u8) -> Option<u8> {
    match std::env::var(CTRL_INDEX) {
        Err(_) => {
            println!("dispatcher");
            let progname = std::env::args().next().unwrap();
            let nocapture = std::env::args().any(|a| a == "--nocapture");
            for value in 0..count {
                let mut command = std::process::Command::new(progname.to_string());
                if nocapture {
                    command.arg("--nocapture");
                }
                let status = command
                    .env(CTRL_INDEX, value.to_string())
                    .status()
                    .expect("Command failed to start");
                assert!(status.success());
            }
            None
        }
        Ok(value) => {
            println!("executor {value}");
            Some(value.parse().unwrap())
        }
    }
}

pub fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[derive(Clone, Debug, PartialEq)]
pub enum Sent {
    Message(ChatId, String),
    Document(ChatId, String),
}

// A transport that records what it is asked to send, and fails for one chat if requested.
#[derive(Clone, Default)]
pub struct Inbox {
    sent: Arc<Mutex<Vec<Sent>>>,
    fail_for: Option<ChatId>,
}

impl Inbox {
    pub fn failing_for<C: Into<ChatId>>(chat: C) -> Self {
        Self {
            sent: Arc::default(),
            fail_for: Some(chat.into()),
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    fn outcome(&self, chat: &ChatId) -> Result<(), TransportError> {
        if self.fail_for.as_ref() == Some(chat) {
            Err(TransportError::Api {
                code: 403,
                description: "Forbidden: bot was blocked by the user".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

impl Transport for Inbox {
    fn send_message(&self, chat: &ChatId, text: &str) -> Result<(), TransportError> {
        self.sent
            .lock()
            .unwrap()
            .push(Sent::Message(chat.clone(), text.to_string()));
        self.outcome(chat)
    }

    fn send_document(&self, chat: &ChatId, path: &Path) -> Result<(), TransportError> {
        let content = std::fs::read_to_string(path)?;
        self.sent
            .lock()
            .unwrap()
            .push(Sent::Document(chat.clone(), content));
        self.outcome(chat)
    }
}
