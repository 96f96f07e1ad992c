use comfy_table::Table;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use gridapi::{AoiDetail, AoiSummary, ExportDetail, GeneratedExport, Geoname, TaskDetail};

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(header);
    table
}

pub fn aoi_list(aois: &[AoiSummary]) {
    let mut t = table(vec!["PRIMARY KEY", "NAME", "CREATED AT"]);
    for aoi in aois {
        t.add_row(vec![aoi.pk.to_string(), aoi.name.clone(), aoi.created_at.clone()]);
    }
    println!("{t}");
}

pub fn aoi_detail(aoi: &AoiDetail) {
    println!("AOI {} \"{}\"", aoi.pk, aoi.name);
    if !aoi.geometry.is_empty() {
        println!("{}", aoi.geometry);
    }
    if aoi.export_set.is_empty() {
        return;
    }
    let mut t = table(vec!["PRIMARY KEY", "NAME", "DATATYPE", "STARTED AT", "STATUS"]);
    for export in &aoi.export_set {
        t.add_row(vec![
            export.pk.to_string(),
            export.name.clone(),
            export.datatype.clone(),
            export.started_at.clone(),
            export.status.clone(),
        ]);
    }
    println!("{t}");
}

pub fn export_files(export: &ExportDetail) {
    println!("Export {} \"{}\" {}", export.pk, export.name, export.status);
    if export.export_files.is_empty() {
        return;
    }
    let mut t = table(vec!["PRIMARY KEY", "NAME", "DATATYPE"]);
    for file in &export.export_files {
        t.add_row(vec![file.pk.to_string(), file.name.clone(), file.datatype.clone()]);
    }
    println!("{t}");
}

pub fn generated(export: &GeneratedExport) {
    let mut t = table(vec!["TASK ID", "EXPORT ID"]);
    t.add_row(vec![export.task_id.clone(), export.export_id.to_string()]);
    println!("{t}");
}

pub fn geonames(rows: &[(String, Geoname)]) {
    let mut t = table(vec!["GEOMETRY", "NAME"]);
    for (geom, geoname) in rows {
        t.add_row(vec![geom.clone(), geoname.name.clone()]);
    }
    println!("{t}");
}

pub fn tasks(tasks: &[TaskDetail]) {
    let mut t = table(vec!["TASK ID", "NAME", "STATE", "TIMESTAMP"]);
    for task in tasks {
        t.add_row(vec![
            task.task_id.clone(),
            task.name.clone(),
            task.state.clone(),
            task.timestamp.clone(),
        ]);
    }
    println!("{t}");
    for task in tasks.iter().filter(|t| !t.traceback.trim().is_empty()) {
        eprintln!("traceback for {}:\n{}", task.task_id, task.traceback.trim_end());
    }
}
