use std::path::Path;

use gridapi::Client;

use super::Tally;
use crate::args::ExportArgs;
use crate::print;

pub fn export(client: &Client, args: &ExportArgs) -> anyhow::Result<()> {
    let (aoi, collects) = args.target()?;
    let generated = client
        .aois()
        .generate_pointcloud_export(aoi, collects, &args.options())?;
    print::generated(&generated);
    Ok(())
}

pub fn pull(client: &Client, pks: &[i64], dir: &Path) -> anyhow::Result<()> {
    let mut tally = Tally::default();
    for &pk in pks {
        match client.download_file(pk, dir) {
            Ok(file) => {
                tally.ok();
                println!("Downloaded {} ({} bytes)", file.path.display(), file.bytes);
            }
            Err(err) => tally.fail(pk, err),
        }
    }
    tally.finish()
}

pub fn task(client: &Client, ids: &[String]) -> anyhow::Result<()> {
    let mut tally = Tally::default();
    let mut found = Vec::new();
    for id in ids {
        match client.tasks().get(id) {
            Ok(task) => {
                tally.ok();
                found.push(task);
            }
            Err(err) => tally.fail(id, err),
        }
    }
    if !found.is_empty() {
        print::tasks(&found);
    }
    tally.finish()
}
