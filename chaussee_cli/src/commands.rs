//! Subcommand implementations.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::{info, warn};

use chaussee_core::admissible::{GrowthLaw, TrafficInput};
use chaussee_core::file_io::{self, FileLock};
use chaussee_core::layer::{
    Layer, LayerField, Notification, NotificationSink, Severity, TracingSink, ValidationEngine,
};
use chaussee_core::materials::{GntCategory, GntParameters};
use chaussee_core::norms::DimensioningMode;
use chaussee_core::project::Project;
use chaussee_core::structure::CompositionReport;
use chaussee_core::CalcResult;

use crate::cli::{CheckArgs, GntArgs, NewArgs, TrafficArgs};

/// Report printed by `check`
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub project: String,
    pub layers: Vec<LayerRow>,
    pub notifications: Vec<Notification>,
    pub interface_changes: Vec<String>,
    pub composition: CompositionReport,
}

impl CheckReport {
    pub fn has_errors(&self) -> bool {
        !self.composition.is_valid() || self.layers.iter().any(|l| !l.out_of_norm.is_empty())
    }
}

#[derive(Debug, Serialize)]
pub struct LayerRow {
    pub order: usize,
    pub material: String,
    pub role: String,
    pub family: String,
    pub mode: String,
    pub thickness: String,
    pub modulus: String,
    pub poisson: String,
    pub interface: String,
    pub ks: f64,
    pub kd: f64,
    pub out_of_norm: Vec<String>,
    pub note: String,
    pub errors: Vec<String>,
}

impl LayerRow {
    fn from_layer(layer: &Layer) -> Self {
        LayerRow {
            order: layer.order,
            material: layer.material_name.clone(),
            role: layer.role().to_string(),
            family: layer.family().code().to_string(),
            mode: layer.mode().to_string(),
            thickness: layer.thickness_display(),
            modulus: layer.modulus_display(),
            poisson: layer.poisson_display(),
            interface: layer
                .interface_with_below
                .map(|i| i.to_string())
                .unwrap_or_else(|| "-".to_string()),
            ks: layer.ks(),
            kd: layer.kd(),
            out_of_norm: LayerField::ALL
                .iter()
                .filter(|f| layer.is_out_of_norm(**f))
                .map(|f| f.to_string())
                .collect(),
            note: layer.correction_note(),
            errors: layer.all_errors().into_iter().map(|(_, e)| e).collect(),
        }
    }
}

pub fn run_new(args: &NewArgs) -> CalcResult<()> {
    if args.path.exists() && !args.force {
        return Err(chaussee_core::CalcError::file_error(
            "create",
            args.path.display().to_string(),
            "file exists, use --force to overwrite",
        ));
    }
    let mut engine = ValidationEngine::new();
    let project = Project::new(args.name.clone(), args.author.clone(), &mut engine);
    file_io::save_project(&project, &args.path)?;
    println!("Created {} ({})", args.path.display(), project.meta.id);
    Ok(())
}

/// Keeps notifications for the report and still logs them.
struct ReportSink {
    collected: Arc<Mutex<Vec<Notification>>>,
    log: TracingSink,
}

impl ReportSink {
    fn new(collected: Arc<Mutex<Vec<Notification>>>) -> Self {
        ReportSink { collected, log: TracingSink }
    }
}

impl NotificationSink for ReportSink {
    fn notify(&mut self, notification: &Notification) {
        self.log.notify(notification);
        if let Ok(mut list) = self.collected.lock() {
            list.push(notification.clone());
        }
    }
}

pub fn run_check(args: &CheckArgs) -> CalcResult<CheckReport> {
    let collected: Arc<Mutex<Vec<Notification>>> = Arc::default();
    let mut engine = ValidationEngine::new().with_sink(ReportSink::new(Arc::clone(&collected)));

    let (mut project, holder) = file_io::load_project_with_lock_check(&args.path)?;
    if let Some(holder) = &holder {
        warn!(user = %holder.user_id, machine = %holder.machine, "project is being edited elsewhere");
    }
    project.revalidate(&mut engine);

    if args.automatic {
        project.structure.set_mode_all(&mut engine, DimensioningMode::Automatic);
    }
    let interface_changes = project.structure.normalize_interfaces();
    let composition = project.structure.check_composition();

    if args.save {
        let _lock = FileLock::acquire(&args.path, args.user.clone())?;
        project.touch();
        file_io::save_project(&project, &args.path)?;
        info!(path = %args.path.display(), "normalised project saved");
    }

    let notifications = collected.lock().map(|l| l.clone()).unwrap_or_default();
    Ok(CheckReport {
        project: project.meta.name.clone(),
        layers: project.structure.layers().iter().map(LayerRow::from_layer).collect(),
        notifications,
        interface_changes,
        composition,
    })
}

pub fn print_check(report: &CheckReport) {
    println!("Project: {}", report.project);
    println!("Structure: {}", report.composition.structure_type);
    println!();
    println!(
        "{:>3}  {:<18} {:<10} {:<5} {:>9} {:>7} {:>5} {:<12} {:>5} {:>5}",
        "#", "Material", "Role", "Fam.", "h (m)", "E (MPa)", "nu", "Interface", "ks", "kd"
    );
    for row in &report.layers {
        let flag = if row.out_of_norm.is_empty() { "" } else { "  !" };
        println!(
            "{:>3}  {:<18} {:<10} {:<5} {:>9} {:>7} {:>5} {:<12} {:>5.2} {:>5.2}{}",
            row.order,
            row.material,
            row.role,
            row.family,
            row.thickness,
            row.modulus,
            row.poisson,
            row.interface,
            row.ks,
            row.kd,
            flag
        );
    }

    let details: Vec<_> = report
        .layers
        .iter()
        .flat_map(|row| row.errors.iter().map(move |e| (row.order, e)))
        .collect();
    if !details.is_empty() {
        println!();
        println!("Validation messages:");
        for (order, text) in details {
            println!("  [{}] {}", order, text);
        }
    }

    if !report.notifications.is_empty() {
        println!();
        println!("Notifications:");
        for n in &report.notifications {
            println!("  {:<8} {}", severity_label(n.severity), n.message);
        }
    }

    if !report.interface_changes.is_empty() {
        println!();
        println!("Interfaces:");
        for change in &report.interface_changes {
            println!("  {}", change);
        }
    }

    let c = &report.composition;
    println!();
    println!("Composition ({}):", if c.is_valid() { "valid" } else { "NOT valid" });
    for e in &c.errors {
        println!("  error    {}", e);
    }
    for w in &c.warnings {
        println!("  warning  {}", w);
    }
    println!("  mean ks = {:.2}, mean kd = {:.2}", c.mean_ks, c.mean_kd);
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "info",
        Severity::Success => "ok",
        Severity::Warning => "warning",
        Severity::Error => "error",
    }
}

pub fn run_gnt(args: &GntArgs) -> CalcResult<()> {
    let category = GntCategory::from_platform_modulus(args.platform_modulus)?;
    let params = GntParameters::for_platform(args.platform_modulus, args.thick_bituminous)?;
    println!(
        "Platform {:.0} MPa -> {} ({})",
        args.platform_modulus,
        category,
        category.platform_range_label()
    );
    println!("  K    = {:.1}", params.k);
    println!("  Emax = {:.0} MPa", params.e_max_mpa);
    Ok(())
}

pub fn run_traffic(args: &TrafficArgs) -> CalcResult<()> {
    let growth = if args.geometric { GrowthLaw::Geometric } else { GrowthLaw::Arithmetic };
    let traffic = TrafficInput::new(args.mja, args.rate, args.years, growth);
    let cumulative = traffic.cumulative()?;
    println!(
        "MJA {} PL/day, {} % {}, {} years",
        args.mja, args.rate, growth, args.years
    );
    println!("  TC = {:.2}", cumulative);
    if let Some(cam) = args.cam {
        println!("  NE = {:.0} (CAM {})", traffic.equivalent_axles(cam)?, cam);
    }
    Ok(())
}
