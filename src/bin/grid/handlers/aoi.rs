use gridapi::{Client, GridError, PkDetails};

use super::Tally;
use crate::print;

pub fn add(client: &Client, geoms: &[String]) -> anyhow::Result<()> {
    let mut tally = Tally::default();
    for geom in geoms {
        let added = client
            .geonames()
            .lookup(geom)
            .and_then(|geoname| client.aois().add(&geoname.name, geom, true));
        match added {
            Ok(aoi) => {
                tally.ok();
                println!(
                    "Successfully created AOI \"{}\" with primary key \"{}\" at {}",
                    aoi.name, aoi.pk, aoi.created_at
                );
            }
            Err(err) => tally.fail(geom, err),
        }
    }
    tally.finish()
}

pub fn lookup(client: &Client, geoms: &[String]) -> anyhow::Result<()> {
    let mut tally = Tally::default();
    let mut rows = Vec::new();
    for geom in geoms {
        match client.geonames().lookup(geom) {
            Ok(geoname) => {
                tally.ok();
                rows.push((geom.clone(), geoname));
            }
            Err(err) => tally.fail(geom, err),
        }
    }
    if !rows.is_empty() {
        print::geonames(&rows);
    }
    tally.finish()
}

pub fn ls(
    client: &Client,
    pks: &[String],
    pk_flags: &[i64],
    geom: Option<&str>,
) -> anyhow::Result<()> {
    if pks.is_empty() && pk_flags.is_empty() {
        let list = client.aois().list(geom)?;
        print::aoi_list(&list.aoi_list);
        return Ok(());
    }

    let mut tally = Tally::default();
    for arg in pks {
        let pk: i64 = match arg.trim().parse() {
            Ok(pk) => pk,
            Err(_) => {
                tally.fail(arg, "primary keys must be integers");
                continue;
            }
        };
        show(client.pk_details(pk), &mut tally);
    }
    for &pk in pk_flags {
        show(client.pk_details(pk), &mut tally);
    }
    tally.finish()
}

fn show(details: PkDetails, tally: &mut Tally) {
    let pk = details.pk;
    match (details.aoi, details.export) {
        (Err(aoi), Err(export)) => {
            if is_not_found(&aoi) && is_not_found(&export) {
                tally.fail(pk, format!("not found as an AOI ({aoi}) nor as an export ({export})"));
            } else {
                tally.fail(pk, format!("lookup failed: AOI: {aoi}; export: {export}"));
            }
        }
        (aoi, export) => {
            let mut failed = false;
            match aoi {
                Ok(aoi) => print::aoi_detail(&aoi),
                Err(err) => failed |= leg_failed(pk, "AOI", &err),
            }
            match export {
                Ok(export) => print::export_files(&export),
                Err(err) => failed |= leg_failed(pk, "export", &err),
            }
            if failed {
                tally.fail(pk, "lookup partially failed");
            } else {
                tally.ok();
            }
        }
    }
}

/// A primary key usually names only one kind of resource, so a not-found leg
/// next to a successful one is expected. Anything else is reported.
fn leg_failed(pk: i64, kind: &str, err: &GridError) -> bool {
    if is_not_found(err) {
        tracing::info!(pk, kind, error = %err, "no such resource");
        false
    } else {
        eprintln!("{pk}: {kind} lookup failed: {err}");
        true
    }
}

fn is_not_found(err: &GridError) -> bool {
    err.status().is_some_and(|s| s.as_u16() == 404) || matches!(err, GridError::Application { .. })
}
