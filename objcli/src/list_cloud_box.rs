use std::io::Write;
use std::rc::Rc;
use log::debug;

use common::error::Errno;
use s3::types::CloudBox;

use crate::client_factory::ClientFactory;
use crate::cloud_url::{decode_url, CloudUrl};
use crate::command::{check_argc, Command, CommandOptions, HelpText, LIST_CLOUD_BOX};
use crate::retry::retry_immediately;

pub static LIST_CLOUD_BOX_HELP: HelpText = HelpText {
    synopsis: "List cloud box information",
    param: "[s3://prefix] [options]",
    syntax: "    objcli list-cloud-boxes [s3://prefix] [-e endpoint] [--limited-num num] [--marker marker]\n",
    detail: "    This command lists the cloud boxes whose name starts with the prefix, page by page.
    --limited-num caps the number of rows, a negative number means no limit.
    --marker must be url encoded, listing starts after it.
",
    sample: "    1) objcli list-cloud-boxes --sign-version v4 --region cn-bj-1
    2) objcli list-cloud-boxes s3://box --limited-num 10
",
};

#[derive(Debug, Default, Clone)]
pub struct ListCloudBoxOptions {
    pub prefix: String,
    // negative means unlimited.
    pub limited_num: i64,
    pub marker: String,
    pub retry_times: i64,
}

pub fn format_row(id: &str, name: &str, owner: &str, region: &str, control: &str, data: &str) -> String {
    format!("{:<30} {:>20} {:<20} {:>12} {:<40} {}", id, name, owner, region, control, data)
}

pub fn format_header() -> String {
    format_row("ID", "Name", "Owner", "Region", "ControlEndpoint", "DataEndpoint")
}

pub fn format_cloud_box(cloud_box: &CloudBox) -> String {
    format_row(&cloud_box.id,
        &cloud_box.name,
        &cloud_box.owner,
        &cloud_box.region,
        &cloud_box.control_endpoint,
        &cloud_box.data_endpoint)
}

pub struct ListCloudBoxCommand {
    factory: Rc<dyn ClientFactory>,
    options: Option<ListCloudBoxOptions>,
}

impl ListCloudBoxCommand {
    pub fn new(factory: Rc<dyn ClientFactory>) -> ListCloudBoxCommand {
        ListCloudBoxCommand {
            factory: factory,
            options: None,
        }
    }

    pub fn options(&self) -> Option<&ListCloudBoxOptions> {
        self.options.as_ref()
    }
}

impl Command for ListCloudBoxCommand {
    fn name(&self) -> &'static str {
        LIST_CLOUD_BOX
    }

    fn help_text(&self) -> &'static HelpText {
        &LIST_CLOUD_BOX_HELP
    }

    fn init(&mut self, args: &[String], options: &CommandOptions) -> Result<(), Errno> {
        check_argc(self.name(), args, 0, 1)?;
        let prefix = match args.first() {
            Some(url) => CloudUrl::parse(url, "")?.bucket,
            None => String::new(),
        };
        let marker = match options.marker.as_ref() {
            Some(marker) => match decode_url(marker) {
                Ok(marker) => marker,
                Err(err) => {
                    return Err(Errno::Einval(format!("invalid marker: {}, {}", marker, err)));
                }
            },
            None => String::new(),
        };

        self.options = Some(ListCloudBoxOptions {
            prefix: prefix,
            limited_num: options.limited_num.unwrap_or(-1),
            marker: marker,
            retry_times: options.retry_times,
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
        let limited_num = opts.limited_num;
        let mut prefix = opts.prefix.clone();
        let mut marker = opts.marker.clone();
        let mut num: i64 = 0;
        while limited_num < 0 || num < limited_num {
            // every attempt reuses the cursor, a failed page has none to advance to.
            let page = retry_immediately(opts.retry_times, "list cloud boxes", || {
                client.list_cloud_boxes(&prefix, &marker, None)
            })?;
            debug!("got {} cloud boxes, truncated: {}, next marker: {}",
                page.cloud_boxes.len(), page.is_truncated, page.next_marker);
            prefix = page.prefix;
            marker = page.next_marker;
            if num == 0 && !page.cloud_boxes.is_empty() {
                writeln!(out, "{}", format_header())?;
            }
            for cloud_box in page.cloud_boxes.iter() {
                if limited_num >= 0 && num >= limited_num {
                    break;
                }
                writeln!(out, "{}", format_cloud_box(cloud_box))?;
                num += 1;
            }
            if !page.is_truncated {
                break;
            }
        }
        Ok(())
    }
}
