//! Structs and functions for generating log messages and check findings.

use crate::prelude::*;
use std::{collections::BTreeMap, thread::JoinHandle};

/// A finding reported by one of the check modules.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, PartialOrd, Ord, Default)]
pub struct Finding {
    /// The short name of the check that generated the finding, e.g. `NullDereference`.
    pub name: String,
    /// The version number of the check.
    pub version: String,
    /// Source positions associated with the finding.
    /// The first position usually denotes the program point the finding was generated for.
    pub locations: Vec<String>,
    /// Term IDs associated with the finding.
    /// May be more exact than the source positions, e.g. for statement terms.
    pub tids: Vec<String>,
    /// Function names associated with the finding.
    pub functions: Vec<String>,
    /// Other useful information. Content depends on the check that generated the finding.
    pub other: Vec<Vec<String>>,
    /// A short description of the finding that is presented to the user.
    /// Should contain all essential information necessary to understand the finding,
    /// including the source position it was generated for.
    pub description: String,
}

impl Finding {
    /// Creates a new finding by only setting name, version and description.
    pub fn new(
        name: impl ToString,
        version: impl ToString,
        description: impl ToString,
    ) -> Finding {
        Finding {
            name: name.to_string(),
            version: version.to_string(),
            locations: Vec::new(),
            tids: Vec::new(),
            functions: Vec::new(),
            other: Vec::new(),
            description: description.to_string(),
        }
    }

    /// Sets the source positions of the finding.
    pub fn locations(mut self, locations: Vec<String>) -> Finding {
        self.locations = locations;
        self
    }

    /// Sets the tids field of the finding.
    pub fn tids(mut self, tids: Vec<String>) -> Finding {
        self.tids = tids;
        self
    }

    /// Sets the associated function names of the finding.
    pub fn functions(mut self, functions: Vec<String>) -> Finding {
        self.functions = functions;
        self
    }

    /// Sets the other field of the finding.
    pub fn other(mut self, other: Vec<Vec<String>>) -> Finding {
        self.other = other;
        self
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "[{}] ({}) {}",
            self.name, self.version, self.description
        )
    }
}

/// A generic log message.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, PartialOrd, Ord)]
pub struct LogMessage {
    /// The log message.
    pub text: String,
    /// The severity/type of the log message.
    pub level: LogLevel,
    /// The term that the message is related to.
    pub location: Option<Tid>,
    /// The analysis where the message originated.
    pub source: Option<String>,
}

impl LogMessage {
    /// Create a new `Info`-level log message.
    pub fn new_info(text: impl Into<String>) -> LogMessage {
        LogMessage {
            text: text.into(),
            level: LogLevel::Info,
            location: None,
            source: None,
        }
    }

    /// Create a new `Debug`-level log message.
    pub fn new_debug(text: impl Into<String>) -> LogMessage {
        LogMessage {
            text: text.into(),
            level: LogLevel::Debug,
            location: None,
            source: None,
        }
    }

    /// Create a new `Error`-level log message.
    pub fn new_error(text: impl Into<String>) -> LogMessage {
        LogMessage {
            text: text.into(),
            level: LogLevel::Error,
            location: None,
            source: None,
        }
    }

    /// Associate a specific term to the log message.
    pub fn location(mut self, location: Tid) -> LogMessage {
        self.location = Some(location);
        self
    }

    /// Set the name of the source analysis for the log message.
    pub fn source(mut self, source: impl Into<String>) -> LogMessage {
        self.source = Some(source.into());
        self
    }
}

/// The severity/type of a log message.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, PartialOrd, Ord)]
pub enum LogLevel {
    /// Messages intended for debugging.
    Debug,
    /// Errors encountered during analysis.
    Error,
    /// Non-error messages intended for the user.
    Info,
}

impl std::fmt::Display for LogMessage {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.level {
            LogLevel::Debug => write!(formatter, "DEBUG: ")?,
            LogLevel::Error => write!(formatter, "ERROR: ")?,
            LogLevel::Info => write!(formatter, "INFO: ")?,
        };
        match (&self.source, &self.location) {
            (Some(source), Some(location)) => {
                write!(formatter, "{} @ {}: ", source, location.location)?
            }
            (Some(source), None) => write!(formatter, "{}: ", source)?,
            (None, Some(location)) => write!(formatter, "{}: ", location.location)?,
            (None, None) => (),
        };
        write!(formatter, "{}", self.text)
    }
}

/// Print all provided log messages and findings.
///
/// Log messages will always be printed to `stdout`.
/// Findings will either be printed to `stdout` or to the file path provided in `out_path`.
///
/// If `emit_json` is set, the findings will be converted to JSON for the output.
pub fn print_all_messages(
    logs: Vec<LogMessage>,
    findings: Vec<Finding>,
    out_path: Option<&str>,
    emit_json: bool,
) {
    for log in logs {
        println!("{}", log);
    }
    let output: String = if emit_json {
        serde_json::to_string_pretty(&findings).unwrap()
    } else {
        findings
            .iter()
            .map(|finding| format!("{}", finding))
            .collect::<Vec<String>>()
            .join("\n")
            + "\n"
    };
    if let Some(file_path) = out_path {
        std::fs::write(file_path, output).unwrap_or_else(|error| {
            panic!("Writing to output path {} failed: {}", file_path, error)
        });
    } else {
        print!("{}", output);
    }
}

/// The message types a logging thread can receive.
/// See the [`LogThread`] type for more information.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, PartialOrd, Ord)]
pub enum LogThreadMsg {
    /// A normal log message.
    Log(LogMessage),
    /// A finding of a check.
    Finding(Finding),
    /// If the log collector thread receives this signal,
    /// it should stop receiving new messages
    /// and instead terminate and return the collected messages prior to receiving the termination signal.
    Terminate,
}

impl From<LogMessage> for LogThreadMsg {
    fn from(msg: LogMessage) -> Self {
        Self::Log(msg)
    }
}

impl From<Finding> for LogThreadMsg {
    fn from(finding: Finding) -> Self {
        Self::Finding(finding)
    }
}

/// A type for managing threads for collecting log messages and findings.
///
/// With [`LogThread::spawn()`] one can create a new log thread
/// whose handle is contained in the returned `LogThread` struct.
/// By calling the [`collect()`](LogThread::collect()) method
/// one can tell the log thread to shut down
/// and return the messages collected to this point.
/// If the `LogThread` object gets dropped before calling `collect()`,
/// the corresponding logging thread will be stopped
/// and all collected messages will be discarded.
///
/// If one deliberately wants to discard all messages,
/// one can simply create a sender to a disconnected channel
/// via [`LogThread::create_disconnected_sender()`].
pub struct LogThread {
    msg_sender: crossbeam_channel::Sender<LogThreadMsg>,
    thread_handle: Option<JoinHandle<(Vec<LogMessage>, Vec<Finding>)>>,
}

impl Drop for LogThread {
    /// If the logging thread still exists,
    /// send it the `Terminate` signal.
    /// Then wait until the logging thread stopped.
    fn drop(&mut self) {
        // Make sure the logging thread gets terminated when dropping this.
        let _ = self.msg_sender.send(LogThreadMsg::Terminate);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl LogThread {
    /// Create a new `LogThread` object with a handle to a freshly spawned logging collector thread.
    ///
    /// The parameter is the function containing the actual collection logic,
    /// i.e. the function should receive messages through the given receiver
    /// until the channel disconnects
    /// or until it receives a [`LogThreadMsg::Terminate`] message.
    /// After that it should return the messages collected up to that point.
    ///
    /// See [`LogThread::collect_and_deduplicate`] for a standard collector function that can be used here.
    pub fn spawn<F>(collector_func: F) -> LogThread
    where
        F: FnOnce(crossbeam_channel::Receiver<LogThreadMsg>) -> (Vec<LogMessage>, Vec<Finding>)
            + Send
            + 'static,
    {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let thread_handle = std::thread::spawn(move || collector_func(receiver));
        LogThread {
            msg_sender: sender,
            thread_handle: Some(thread_handle),
        }
    }

    /// Just create a disconnected sender to a (non-existing) logging thread.
    /// Can be used like a sender to a channel that deliberately discards all messages sent to it.
    pub fn create_disconnected_sender() -> crossbeam_channel::Sender<LogThreadMsg> {
        let (sender, _) = crossbeam_channel::unbounded();
        sender
    }

    /// Get a sender that can be used to send messages to the logging thread corresponding to this `LogThread` instance.
    pub fn get_msg_sender(&self) -> crossbeam_channel::Sender<LogThreadMsg> {
        self.msg_sender.clone()
    }

    /// Stop the logging thread by sending it the `Terminate` signal
    /// and then return all messages collected until that point.
    pub fn collect(mut self) -> (Vec<LogMessage>, Vec<Finding>) {
        let _ = self.msg_sender.send(LogThreadMsg::Terminate);
        if let Some(handle) = self.thread_handle.take() {
            handle.join().unwrap()
        } else {
            (Vec::new(), Vec::new())
        }
    }

    /// This function collects messages from the given receiver
    /// until a [`LogThreadMsg::Terminate`] signal is received.
    /// All collected messages are deduplicated before being returned.
    ///
    /// Findings and log messages are deduplicated if two messages share the same source position of origin.
    /// In such a case only the last message received is kept.
    /// If a finding has more than one position only the first position is considered when deduplicating.
    /// Note that this may lead to information loss
    /// if messages with the same origin position that are not duplicates are generated.
    ///
    /// This function can be used as a standard collector function for [`LogThread::spawn`].
    pub fn collect_and_deduplicate(
        receiver: crossbeam_channel::Receiver<LogThreadMsg>,
    ) -> (Vec<LogMessage>, Vec<Finding>) {
        let mut logs_with_location = BTreeMap::new();
        let mut general_logs = Vec::new();
        let mut collected_findings = BTreeMap::new();

        while let Ok(log_thread_msg) = receiver.recv() {
            match log_thread_msg {
                LogThreadMsg::Log(log_message) => {
                    if let Some(ref tid) = log_message.location {
                        logs_with_location.insert(tid.location, log_message);
                    } else {
                        general_logs.push(log_message);
                    }
                }
                LogThreadMsg::Finding(finding) => match &finding.locations[..] {
                    [] => panic!("Unexpected finding without origin position"),
                    [location, ..] => {
                        collected_findings.insert(location.clone(), finding);
                    }
                },
                LogThreadMsg::Terminate => break,
            }
        }
        let logs = logs_with_location
            .values()
            .cloned()
            .chain(general_logs)
            .collect();
        let findings = collected_findings.into_values().collect();
        (logs, findings)
    }
}
