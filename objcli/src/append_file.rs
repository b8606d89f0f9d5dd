use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Instant;
use log::info;

use common::error::Errno;
use s3::types::AppendObjectInput;
use s3::ObjectService;

use crate::client_factory::ClientFactory;
use crate::cloud_url::CloudUrl;
use crate::command::{check_argc, Command, CommandOptions, HelpText, APPEND_FROM_FILE};
use crate::progress::AppendProgressListener;

/// Largest local file an append object can take.
pub const MAX_APPEND_OBJECT_SIZE: u64 = 5 * 1024 * 1024 * 1024;

// standard headers that may be set together with x-amz-meta-*.
const ALLOWED_HEADERS: [&str; 6] = [
    "cache-control",
    "content-type",
    "content-disposition",
    "content-encoding",
    "content-language",
    "expires",
];
const USER_META_PREFIX: &str = "x-amz-meta-";

pub static APPEND_FILE_HELP: HelpText = HelpText {
    synopsis: "Upload the contents of the local file to the object by append upload mode",
    param: "local_file_name s3://bucket/object [options]",
    syntax: "    objcli append-from-file local_file_name s3://bucket/object [options]\n",
    detail: "    1) If the object does not exist, you can set the meta of the object with --meta,
       for example --meta \"X-Amz-Meta-Author:someone\" sets X-Amz-Meta-Author to someone.
       Several headers are separated by #.
    2) If the object already exists, --meta is rejected, the meta of an existing
       append object can not be changed.
    3) The upload starts at the current length of the object, so running the command
       again appends the file again.
",
    sample: "    1) objcli append-from-file local_file_name s3://bucket/object
    2) objcli append-from-file local_file_name s3://bucket/object --meta \"X-Amz-Meta-Author:someone#Content-Type:text/plain\"
",
};

#[derive(Debug, Default, Clone)]
pub struct AppendFileOptions {
    pub bucket: String,
    pub object: String,
    pub file_name: PathBuf,
    pub file_size: u64,
    pub metas: Vec<(String, String)>,
    // KB/s, 0 means unlimited.
    pub max_speed: u64,
}

/// Parses `key:value#key:value`, only user meta and a few standard headers are accepted.
pub fn parse_metas(meta: &str) -> Result<Vec<(String, String)>, Errno> {
    let mut metas = Vec::new();
    for item in meta.split('#') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let (key, value) = match item.find(':') {
            Some(idx) => (item[..idx].trim(), item[idx + 1..].trim()),
            None => {
                return Err(Errno::Einval(format!("invalid meta: {}, it should be key:value", item)));
            }
        };
        if key.is_empty() {
            return Err(Errno::Einval(format!("invalid meta: {}, the key is empty", item)));
        }
        let lower = key.to_ascii_lowercase();
        let is_user_meta = lower.starts_with(USER_META_PREFIX) && lower.len() > USER_META_PREFIX.len();
        if !is_user_meta && !ALLOWED_HEADERS.contains(&lower.as_str()) {
            return Err(Errno::Einval(format!("unsupported meta: {}, only {}* and {} are allowed",
                key, USER_META_PREFIX, ALLOWED_HEADERS.join(", "))));
        }
        metas.push((key.to_string(), value.to_string()));
    }
    Ok(metas)
}

pub struct AppendFileCommand {
    factory: Rc<dyn ClientFactory>,
    options: Option<AppendFileOptions>,
}

impl AppendFileCommand {
    pub fn new(factory: Rc<dyn ClientFactory>) -> AppendFileCommand {
        AppendFileCommand {
            factory: factory,
            options: None,
        }
    }

    pub fn options(&self) -> Option<&AppendFileOptions> {
        self.options.as_ref()
    }

    fn append_from_file(&self,
        client: &dyn ObjectService,
        opts: &AppendFileOptions,
        position: u64,
        exist: bool,
        out: &mut dyn Write) -> Result<(), Errno> {
        let input = AppendObjectInput {
            bucket: opts.bucket.clone(),
            object: opts.object.clone(),
            position: position,
            file_path: opts.file_name.clone(),
            // meta is only taken when the object is created.
            headers: if exist { Vec::new() } else { opts.metas.clone() },
            max_speed: opts.max_speed,
        };

        let start = Instant::now();
        let resp = client.append_object_from_file(&input, Some(Box::new(AppendProgressListener::new())))?;
        let cost = start.elapsed().as_millis().max(1);
        let speed = opts.file_size as f64 / cost as f64;
        info!("appended {:?} to {}/{}, new size: {}", opts.file_name, opts.bucket, opts.object, resp.next_append_position);
        writeln!(out, "\nlocal file size is {},the object new size is {},average speed is {:.2}(KB/s)\n",
            opts.file_size, resp.next_append_position, speed)?;
        Ok(())
    }
}

impl Command for AppendFileCommand {
    fn name(&self) -> &'static str {
        APPEND_FROM_FILE
    }

    fn help_text(&self) -> &'static HelpText {
        &APPEND_FILE_HELP
    }

    fn init(&mut self, args: &[String], options: &CommandOptions) -> Result<(), Errno> {
        check_argc(self.name(), args, 2, 2)?;
        let encoding_type = options.encoding_type.clone().unwrap_or_default();
        let url = CloudUrl::parse(&args[1], &encoding_type)?;
        if url.object.is_empty() {
            return Err(Errno::Einval(String::from("object key is empty")));
        }

        // check input file, metadata only.
        let file_name = PathBuf::from(&args[0]);
        let stat = match std::fs::metadata(&file_name) {
            Ok(stat) => stat,
            Err(err) => {
                return Err(Errno::Einval(format!("invalid local file {}, err: {}", args[0], err)));
            }
        };
        if stat.is_dir() {
            return Err(Errno::Einval(format!("{} is dir", args[0])));
        }
        if stat.len() > MAX_APPEND_OBJECT_SIZE {
            return Err(Errno::Einval(format!("local file {} is bigger than {}, it is not supported by append",
                args[0], MAX_APPEND_OBJECT_SIZE)));
        }

        let metas = match options.meta.as_ref() {
            Some(meta) => parse_metas(meta)?,
            None => Vec::new(),
        };

        self.options = Some(AppendFileOptions {
            bucket: url.bucket,
            object: url.object,
            file_name: file_name,
            file_size: stat.len(),
            metas: metas,
            max_speed: options.max_up_speed.unwrap_or(0),
        });
        Ok(())
    }

    fn run(&mut self, out: &mut dyn Write) -> Result<(), Errno> {
        let opts = match self.options.as_ref() {
            Some(opts) => opts,
            None => {
                return Err(Errno::Eintr(format!("{} is not initialized", self.name())));
            }
        };

        let client = self.factory.create()?;
        let exist = client.is_object_exist(&opts.bucket, &opts.object)?;
        if exist && !opts.metas.is_empty() {
            return Err(Errno::Einval(String::from("setting meta on existing append object is not supported")));
        }

        let position = if exist {
            client.head_object(&opts.bucket, &opts.object)?.size
        } else {
            0
        };
        info!("append {:?} to {}/{} from position {}", opts.file_name, opts.bucket, opts.object, position);
        self.append_from_file(client.as_ref(), opts, position, exist, out)
    }
}
