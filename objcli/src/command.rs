use std::io::Write;
use std::rc::Rc;
use log::debug;

use common::error::Errno;

use crate::append_file::{AppendFileCommand, APPEND_FILE_HELP};
use crate::client_factory::ClientFactory;
use crate::list_cloud_box::{ListCloudBoxCommand, LIST_CLOUD_BOX_HELP};

pub const LIST_CLOUD_BOX: &str = "list-cloud-boxes";
pub const APPEND_FROM_FILE: &str = "append-from-file";

#[derive(Debug)]
pub struct HelpText {
    pub synopsis: &'static str,
    pub param: &'static str,
    pub syntax: &'static str,
    pub detail: &'static str,
    pub sample: &'static str,
}

impl HelpText {
    pub fn usage(&self, name: &str) -> String {
        format!("objcli {} {}", name, self.param)
    }

    // printed with the usage line when `init` rejects the arguments.
    pub fn after_help(&self) -> String {
        format!("SYNTAX:\n{}\nDETAIL:\n{}\nSAMPLES:\n{}", self.syntax, self.detail, self.sample)
    }
}

/// Options shared by the command line, each command picks what it understands.
#[derive(Debug, Clone)]
pub struct CommandOptions {
    pub encoding_type: Option<String>,
    pub meta: Option<String>,
    pub limited_num: Option<i64>,
    pub marker: Option<String>,
    pub max_up_speed: Option<u64>,
    pub retry_times: i64,
}

impl Default for CommandOptions {
    fn default() -> Self {
        CommandOptions {
            encoding_type: None,
            meta: None,
            limited_num: None,
            marker: None,
            max_up_speed: None,
            retry_times: common::config::DEFAULT_RETRY_TIMES,
        }
    }
}

pub trait Command {
    fn name(&self) -> &'static str;

    fn help_text(&self) -> &'static HelpText;

    /// Validates the arguments, nothing is sent to the service here.
    fn init(&mut self, args: &[String], options: &CommandOptions) -> Result<(), Errno>;

    fn run(&mut self, out: &mut dyn Write) -> Result<(), Errno>;
}

pub fn check_argc(name: &str, args: &[String], min: usize, max: usize) -> Result<(), Errno> {
    if args.len() < min {
        return Err(Errno::Einval(format!("the command {} needs at least {} arguments, got {}", name, min, args.len())));
    }
    if args.len() > max {
        return Err(Errno::Einval(format!("the command {} takes at most {} arguments, got {}", name, max, args.len())));
    }
    Ok(())
}

pub fn help_texts() -> Vec<(&'static str, &'static HelpText)> {
    vec![
        (LIST_CLOUD_BOX, &LIST_CLOUD_BOX_HELP),
        (APPEND_FROM_FILE, &APPEND_FILE_HELP),
    ]
}

pub fn new_command(name: &str, factory: Rc<dyn ClientFactory>) -> Option<Box<dyn Command>> {
    match name {
        LIST_CLOUD_BOX => Some(Box::new(ListCloudBoxCommand::new(factory))),
        APPEND_FROM_FILE => Some(Box::new(AppendFileCommand::new(factory))),
        _ => None,
    }
}

/// Prints the failure once for the user, the log only keeps the details.
pub fn report_error(err: &Errno, out: &mut dyn Write) -> std::io::Result<()> {
    debug!("command failed, err: {:?}", err);
    writeln!(out, "Error: {}", err)
}
