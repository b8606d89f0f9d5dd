use std::path::PathBuf;
use std::str::FromStr;
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use log::debug;

use common::config::{Config, DEFAULT_REGION};
use common::error::Errno;
use common::parse_config;
use s3::signature::SignVersion;

use crate::client_factory::ClientOptions;
use crate::command::{help_texts, CommandOptions, APPEND_FROM_FILE, LIST_CLOUD_BOX};

pub const DEFAULT_CONFIG_FILE: &str = ".objcli.toml";

static GLOBAL_ARGS: [(&str, Option<&str>, &str); 16] = [
    ("config-file", Some("c"), "config file path, default is ~/.objcli.toml"),
    ("endpoint", Some("e"), "endpoint of the object storage, such as s3.example.com:8080"),
    ("access-key-id", Some("i"), "access key id"),
    ("access-key-secret", Some("k"), "access key secret"),
    ("sts-token", Some("t"), "sts token of temporary credentials"),
    ("region", None, "region of the endpoint"),
    ("sign-version", None, "signature version, v2 or v4"),
    ("retry-times", None, "max attempts of a failed listing request, default 10"),
    ("connect-timeout", None, "connect timeout in seconds, 0 means no timeout"),
    ("read-timeout", None, "read timeout in seconds, 0 means no timeout"),
    ("user-agent", None, "user agent of the requests"),
    ("proxy-host", None, "http proxy, such as http://proxy.example.com:3128"),
    ("proxy-user", None, "user name of the proxy"),
    ("proxy-pwd", None, "password of the proxy"),
    ("loglevel", None, "log level: off|error|warn|info|debug|trace"),
    ("logfile", None, "log file path, logs go to stderr by default"),
];

#[derive(Debug, Default)]
pub struct Options {
    pub config_file_path: String,
    pub client: ClientOptions,
    pub log_level: String,
    pub log_file: String,
    pub command: String,
    pub args: Vec<String>,
    pub command_options: CommandOptions,
}

fn command_args(name: &str) -> Vec<Arg<'static, 'static>> {
    match name {
        LIST_CLOUD_BOX => vec![
            Arg::with_name("limited-num")
                .long("limited-num")
                .help("max number of cloud boxes to list, negative means no limit")
                .allow_hyphen_values(true)
                .takes_value(true),
            Arg::with_name("marker")
                .long("marker")
                .help("url encoded name after which the listing starts")
                .takes_value(true),
        ],
        APPEND_FROM_FILE => vec![
            Arg::with_name("meta")
                .long("meta")
                .help("headers of the new object, such as X-Amz-Meta-Author:someone#Content-Type:text/plain")
                .takes_value(true),
            Arg::with_name("encoding-type")
                .long("encoding-type")
                .help("the cloud url is url encoded when it is url")
                .possible_values(&["url"])
                .takes_value(true),
            Arg::with_name("maxupspeed")
                .long("maxupspeed")
                .help("max upload speed in KB/s, 0 means no limit")
                .takes_value(true),
        ],
        _ => Vec::new(),
    }
}

pub fn build_app() -> App<'static, 'static> {
    let mut app = App::new("objcli")
        .version(env!("CARGO_PKG_VERSION"))
        .about("command line tool of the object storage")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .setting(AppSettings::VersionlessSubcommands);

    for &(name, short, help) in GLOBAL_ARGS.iter() {
        let mut arg = Arg::with_name(name)
            .long(name)
            .help(help)
            .takes_value(true)
            .global(true);
        if let Some(short) = short {
            arg = arg.short(short);
        }
        app = app.arg(arg);
    }
    app = app.arg(Arg::with_name("skip-verify-cert")
        .long("skip-verify-cert")
        .help("do not verify the certificate of the endpoint")
        .global(true));

    for (name, help) in help_texts() {
        let sub = SubCommand::with_name(name)
            .about(help.synopsis)
            .usage(help.syntax.trim())
            .after_help(help.detail)
            .arg(Arg::with_name("args")
                .help(help.param)
                .multiple(true))
            .args(&command_args(name));
        app = app.subcommand(sub);
    }
    app
}

// global args given before the command only land in the top level matches.
fn value_of(top: &ArgMatches, sub: &ArgMatches, name: &str) -> Option<String> {
    sub.value_of(name)
        .or_else(|| top.value_of(name))
        .map(|v| v.to_string())
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> Result<T, Errno> {
    match value.trim().parse::<T>() {
        Ok(v) => Ok(v),
        Err(_) => Err(Errno::Einval(format!("invalid {}: {}, it should be a number", name, value))),
    }
}

fn number_of<T: FromStr>(top: &ArgMatches, sub: &ArgMatches, name: &str) -> Result<Option<T>, Errno> {
    match value_of(top, sub, name) {
        Some(value) => Ok(Some(parse_number::<T>(name, &value)?)),
        None => Ok(None),
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(DEFAULT_CONFIG_FILE))
}

// an explicit config file must exist, the default one is optional.
fn load_config(path: &Option<String>) -> Result<(String, Config), Errno> {
    if let Some(path) = path {
        return Ok((path.clone(), parse_config(path)?));
    }
    if let Some(path) = default_config_path() {
        if path.is_file() {
            let path = path.to_string_lossy().to_string();
            let cfg = parse_config(&path)?;
            return Ok((path, cfg));
        }
    }
    Ok((String::new(), Config::default()))
}

fn pick(flag: Option<String>, cfg: &str) -> String {
    match flag {
        Some(v) => v,
        None => cfg.to_string(),
    }
}

pub fn resolve(matches: &ArgMatches) -> Result<Options, Errno> {
    let (command, sub) = match matches.subcommand() {
        (name, Some(sub)) => (name.to_string(), sub),
        _ => {
            return Err(Errno::Einval(String::from("no command is given")));
        }
    };

    let (config_file_path, cfg) = load_config(&value_of(matches, sub, "config-file"))?;
    let creds = &cfg.credentials;
    let mut region = pick(value_of(matches, sub, "region"), &creds.region);
    if region.is_empty() {
        region = DEFAULT_REGION.to_string();
    }
    let sign_version = SignVersion::parse(&pick(value_of(matches, sub, "sign-version"), &creds.sign_version))?;
    let client = ClientOptions {
        endpoint: pick(value_of(matches, sub, "endpoint"), &creds.endpoint),
        access_key_id: pick(value_of(matches, sub, "access-key-id"), &creds.access_key_id),
        access_key_secret: pick(value_of(matches, sub, "access-key-secret"), &creds.access_key_secret),
        sts_token: pick(value_of(matches, sub, "sts-token"), &creds.sts_token),
        region: region,
        sign_version: sign_version,
        connect_timeout: number_of(matches, sub, "connect-timeout")?.unwrap_or(cfg.transport.connect_timeout),
        read_timeout: number_of(matches, sub, "read-timeout")?.unwrap_or(cfg.transport.read_timeout),
        user_agent: pick(value_of(matches, sub, "user-agent"), &cfg.transport.user_agent),
        proxy_host: pick(value_of(matches, sub, "proxy-host"), &cfg.transport.proxy_host),
        proxy_user: pick(value_of(matches, sub, "proxy-user"), &cfg.transport.proxy_user),
        proxy_pwd: pick(value_of(matches, sub, "proxy-pwd"), &cfg.transport.proxy_pwd),
        skip_verify_cert: sub.is_present("skip-verify-cert")
            || matches.is_present("skip-verify-cert")
            || cfg.transport.skip_verify_cert,
    };

    let command_options = CommandOptions {
        encoding_type: sub.value_of("encoding-type").map(|v| v.to_string()),
        meta: sub.value_of("meta").map(|v| v.to_string()),
        limited_num: number_of(matches, sub, "limited-num")?,
        marker: sub.value_of("marker").map(|v| v.to_string()),
        max_up_speed: number_of(matches, sub, "maxupspeed")?,
        retry_times: number_of(matches, sub, "retry-times")?.unwrap_or(cfg.transport.retry_times),
    };

    let args = match sub.values_of("args") {
        Some(values) => values.map(|v| v.to_string()).collect(),
        None => Vec::new(),
    };

    let opts = Options {
        config_file_path: config_file_path,
        client: client,
        log_level: pick(value_of(matches, sub, "loglevel"), &cfg.log.level),
        log_file: pick(value_of(matches, sub, "logfile"), &cfg.log.file),
        command: command,
        args: args,
        command_options: command_options,
    };
    debug!("resolved options of {}: args: {:?}, {:?}", opts.command, opts.args, opts.command_options);
    Ok(opts)
}
