use std::rc::Rc;
use log::info;

use common::error::Errno;
use common::logger::init_log;
use objcli::client_factory::{ClientFactory, S3ClientFactory};
use objcli::command::{new_command, report_error};
use objcli::options;

fn run() -> Result<(), Errno> {
    let matches = match options::build_app().get_matches_safe() {
        Ok(matches) => matches,
        Err(err) => {
            // prints help, version or the usage error and exits.
            err.exit();
        }
    };
    let opts = options::resolve(&matches)?;
    init_log(&opts.log_level, &opts.log_file)?;
    info!("run {} with args: {:?}, config file: {}", opts.command, opts.args, opts.config_file_path);

    let factory: Rc<dyn ClientFactory> = Rc::new(S3ClientFactory::new(opts.client.clone()));
    let mut command = match new_command(&opts.command, factory) {
        Some(command) => command,
        None => {
            return Err(Errno::Einval(format!("unknown command: {}", opts.command)));
        }
    };
    if let Err(err) = command.init(&opts.args, &opts.command_options) {
        if err.is_validation() {
            let help = command.help_text();
            eprintln!("usage: {}\n\n{}", help.usage(command.name()), help.after_help());
        }
        return Err(err);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    command.run(&mut out)
}

fn main() {
    if let Err(err) = run() {
        let stderr = std::io::stderr();
        let _ = report_error(&err, &mut stderr.lock());
        std::process::exit(1);
    }
}
