use canon_validator::core::config::ValidatorConfig;
use canon_validator::engine::result::ValidationResult;
use canon_validator::engine::{ImplementationStatus, Severity, ValidationEngine, ValidationStatus, ViolationType};
use canon_validator::roadmap::loader::{parse_roadmap, FileRoadmap};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const DOMAIN: &str = "src/main/java/com/budgetpro/domain";
const REST: &str = "src/main/java/com/budgetpro/infrastructure/rest";

fn write(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

fn proyecto_entity(root: &Path) {
    write(
        root,
        &format!("{}/model/proyecto/Proyecto.java", DOMAIN),
        "package com.budgetpro.domain.model.proyecto;\n\npublic final class Proyecto {\n    private final ProyectoId id;\n    private String nombre;\n}\n",
    );
}

fn presupuesto_module(root: &Path) {
    write(
        root,
        &format!("{}/model/presupuesto/Presupuesto.java", DOMAIN),
        r#"package com.budgetpro.domain.model.presupuesto;

/** Aggregate root of the budget. */
public class Presupuesto {
    private EstadoPresupuesto estado;
    private List<Partida> partidas;

    public void aprobar() {
        if (this.estado == EstadoPresupuesto.BORRADOR) {
            this.estado = EstadoPresupuesto.APROBADO;
        }
    }
}
"#,
    );
    write(
        root,
        &format!("{}/model/presupuesto/EstadoPresupuesto.java", DOMAIN),
        "package com.budgetpro.domain.model.presupuesto;\n\npublic enum EstadoPresupuesto {\n    BORRADOR,\n    APROBADO\n}\n",
    );
    write(
        root,
        &format!("{}/service/CalculoPresupuestoService.java", DOMAIN),
        "package com.budgetpro.domain.service;\n\npublic class CalculoPresupuestoService {\n    public CalculoPresupuestoService() {}\n    public void calcular() {}\n}\n",
    );
    write(
        root,
        &format!("{}/PresupuestoController.java", REST),
        "package com.budgetpro.infrastructure.rest;\n\n@RestController\n@RequestMapping(\"/api/v1/presupuestos\")\npublic class PresupuestoController {\n    @GetMapping(\"/{id}\")\n    public Object get() { return null; }\n}\n",
    );
}

fn roadmap_file(root: &Path, json: &str) -> FileRoadmap {
    let path = root.join("roadmap.json");
    fs::write(&path, json).unwrap();
    FileRoadmap::new(path)
}

fn without_baseline() -> ValidatorConfig {
    let mut config = ValidatorConfig::default();
    config.baseline.enabled = false;
    config
}

const PROYECTO_PRESUPUESTO: &str = r#"{
  "roadmap": {
    "version": "1.0.0",
    "modules": [
      { "id": "proyecto", "name": "Proyecto", "phase": "foundation", "priority": "critical", "dependencies": [] },
      { "id": "presupuesto", "name": "Presupuesto", "phase": "foundation", "priority": "critical",
        "dependencies": ["proyecto"] }
    ]
  }
}"#;

#[test]
fn presupuesto_without_code_does_not_block_on_proyecto() {
    let repo = tempdir().unwrap();
    proyecto_entity(repo.path());
    let roadmap = roadmap_file(repo.path(), PROYECTO_PRESUPUESTO);

    let result = ValidationEngine::new(without_baseline()).validate(repo.path(), &roadmap);
    let presupuesto = result.module_status("presupuesto").unwrap();
    assert_eq!(presupuesto.implementation_status, ImplementationStatus::NotStarted);
    assert!(presupuesto.missing_dependencies.is_empty());
    assert!(
        result
            .violations_for("presupuesto")
            .all(|v| v.violation_type != ViolationType::DataDependency)
    );
    assert_eq!(
        result.module_status("proyecto").unwrap().implementation_status,
        ImplementationStatus::InProgress
    );
    assert_eq!(result.status(), ValidationStatus::Passed);
    assert_eq!(result.exit_code(false), 0);
}

#[test]
fn state_machine_missing_a_state_reports_detected_and_expected() {
    let repo = tempdir().unwrap();
    write(
        repo.path(),
        &format!("{}/model/presupuesto/EstadoPresupuesto.java", DOMAIN),
        "package com.budgetpro.domain.model.presupuesto;\n\npublic enum EstadoPresupuesto { BORRADOR }\n",
    );
    let roadmap = roadmap_file(
        repo.path(),
        r#"{
  "version": "1.0.0",
  "modules": [
    { "id": "presupuesto", "name": "Presupuesto", "phase": "foundation", "priority": "critical",
      "validationRules": [
        { "type": "state_machine_exists", "target": "EstadoPresupuesto", "requiredStates": ["BORRADOR", "APROBADO"] }
      ] }
  ]
}"#,
    );

    let result = ValidationEngine::new(without_baseline()).validate(repo.path(), &roadmap);
    let violations: Vec<_> = result.violations_for("presupuesto").collect();
    assert_eq!(violations.len(), 1);
    let v = violations[0];
    assert!(v.message.contains("APROBADO"));
    assert_eq!(v.context["detected"], serde_json::json!(["BORRADOR"]));
    assert_eq!(v.context["expected"], serde_json::json!(["BORRADOR", "APROBADO"]));
    assert_eq!(result.status(), ValidationStatus::CriticalViolations);
}

#[test]
fn progressing_module_with_idle_prerequisite_is_critical() {
    let repo = tempdir().unwrap();
    presupuesto_module(repo.path());
    let roadmap = roadmap_file(repo.path(), PROYECTO_PRESUPUESTO);

    let result = ValidationEngine::new(without_baseline()).validate(repo.path(), &roadmap);
    let presupuesto = result.module_status("presupuesto").unwrap();
    assert_eq!(presupuesto.implementation_status, ImplementationStatus::Complete);
    assert_eq!(presupuesto.missing_dependencies, vec!["proyecto"]);
    assert_eq!(presupuesto.detected_endpoints, vec!["GET /api/v1/presupuestos/{id}"]);

    let blocking: Vec<_> = result
        .violations_for("presupuesto")
        .filter(|v| v.violation_type == ViolationType::DataDependency)
        .collect();
    assert_eq!(blocking.len(), 1);
    assert!(blocking[0].blocking);
    assert_eq!(blocking[0].severity, Severity::Critical);
    assert!(blocking[0].message.contains("presupuesto") && blocking[0].message.contains("proyecto"));
    assert_eq!(blocking[0].context["dependency_status"], "NOT_STARTED");

    let premature: Vec<_> = result
        .violations_for("presupuesto")
        .filter(|v| v.severity == Severity::Warning)
        .collect();
    assert_eq!(premature.len(), 1);
    assert!(!premature[0].blocking);
    assert_eq!(result.status(), ValidationStatus::CriticalViolations);
    assert_eq!(result.exit_code(false), 1);
}

#[test]
fn failing_optional_rule_warns_without_holding_back_completion() {
    let repo = tempdir().unwrap();
    presupuesto_module(repo.path());
    let roadmap = roadmap_file(
        repo.path(),
        r#"{
  "version": "1.0.0",
  "modules": [
    { "id": "presupuesto", "name": "Presupuesto", "phase": "foundation", "priority": "critical",
      "validation_rules": [
        { "type": "entity_exists", "target": "Presupuesto" },
        { "type": "service_exists", "target": "CalculoPresupuesto", "required_methods": ["calcular"] },
        { "type": "state_machine_exists", "target": "EstadoPresupuesto", "required_states": ["BORRADOR", "APROBADO"] },
        { "type": "relationship_exists", "source": "Presupuesto", "target": "Partida", "required": false },
        { "type": "table_exists", "target": "presupuesto" }
      ] }
  ]
}"#,
    );

    let result = ValidationEngine::new(without_baseline()).validate(repo.path(), &roadmap);
    // Partida is not an entity yet. Only the optional rule fails, which leaves
    // the module complete with a single warning.
    assert_eq!(
        result.module_status("presupuesto").unwrap().implementation_status,
        ImplementationStatus::Complete
    );
    assert_eq!(result.violations.len(), 1);
    assert_eq!(result.violations[0].severity, Severity::Warning);
    assert!(!result.violations[0].blocking);
    assert_eq!(result.status(), ValidationStatus::Warnings);
    assert_eq!(result.exit_code(false), 2);
    assert_eq!(result.exit_code(true), 1);

    write(
        repo.path(),
        &format!("{}/model/presupuesto/Partida.java", DOMAIN),
        "package com.budgetpro.domain.model.presupuesto;\n\npublic final class Partida {}\n",
    );
    let result = ValidationEngine::new(without_baseline()).validate(repo.path(), &roadmap);
    assert_eq!(
        result.module_status("presupuesto").unwrap().implementation_status,
        ImplementationStatus::Complete
    );
    assert!(result.violations.is_empty());
    assert_eq!(result.status(), ValidationStatus::Passed);
}

#[test]
fn asymmetric_coupling_is_critical_even_when_nothing_is_built() {
    let repo = tempdir().unwrap();
    let roadmap = roadmap_file(
        repo.path(),
        r#"{
  "version": "1.0.0",
  "modules": [
    { "id": "presupuesto", "name": "Presupuesto", "phase": "foundation", "priority": "critical",
      "constraints": [ { "type": "temporal_coupling", "rule": "freeze together", "coupledWith": "tiempo" } ] },
    { "id": "tiempo", "name": "Tiempo", "phase": "foundation", "priority": "critical" }
  ]
}"#,
    );

    let result = ValidationEngine::default().validate(repo.path(), &roadmap);
    assert!(result
        .module_statuses
        .iter()
        .all(|s| s.implementation_status == ImplementationStatus::NotStarted));
    let temporal: Vec<_> = result
        .violations
        .iter()
        .filter(|v| v.violation_type == ViolationType::TemporalDependency)
        .collect();
    // One from the module constraint, one from the baseline check.
    assert_eq!(temporal.len(), 2);
    assert!(temporal.iter().all(|v| v.severity == Severity::Critical && v.blocking));
}

const COUPLED: &str = r#"{
  "version": "1.0.0",
  "modules": [
    { "id": "presupuesto", "name": "Presupuesto", "phase": "foundation", "priority": "critical",
      "constraints": [ { "type": "temporal_coupling", "rule": "freeze together", "coupledWith": "tiempo" } ] },
    { "id": "tiempo", "name": "Tiempo", "phase": "foundation", "priority": "critical",
      "constraints": [ { "type": "temporal_coupling", "rule": "freeze together", "coupledWith": "presupuesto" } ] }
  ]
}"#;

fn tiempo_module(root: &Path) {
    write(
        root,
        &format!("{}/model/tiempo/ProgramaObra.java", DOMAIN),
        "package com.budgetpro.domain.model.tiempo;\n\npublic class ProgramaObra {\n    private String nombre;\n}\n",
    );
    write(
        root,
        &format!("{}/service/CalculoCronogramaService.java", DOMAIN),
        "package com.budgetpro.domain.service;\n\npublic class CalculoCronogramaService {\n    public void calcular() {}\n}\n",
    );
}

fn freeze_services(root: &Path) {
    write(
        root,
        &format!("{}/service/CongelarPresupuestoService.java", DOMAIN),
        "package com.budgetpro.domain.service;\n\npublic class CongelarPresupuestoService {\n    public void congelar() {}\n}\n",
    );
    write(
        root,
        &format!("{}/service/FreezeCronogramaService.java", DOMAIN),
        "package com.budgetpro.domain.service;\n\npublic class FreezeCronogramaService {\n    public void freeze() {}\n}\n",
    );
}

fn temporal(result: &ValidationResult) -> Vec<&canon_validator::engine::violation::Violation> {
    result
        .violations
        .iter()
        .filter(|v| v.violation_type == ViolationType::TemporalDependency)
        .collect()
}

#[test]
fn coupled_module_built_alone_is_critical_from_both_sides() {
    let repo = tempdir().unwrap();
    presupuesto_module(repo.path());
    let roadmap = roadmap_file(repo.path(), COUPLED);

    let result = ValidationEngine::new(without_baseline()).validate(repo.path(), &roadmap);
    assert_eq!(
        result.module_status("presupuesto").unwrap().implementation_status,
        ImplementationStatus::Complete
    );
    assert_eq!(
        result.module_status("tiempo").unwrap().implementation_status,
        ImplementationStatus::NotStarted
    );

    let temporal = temporal(&result);
    assert_eq!(temporal.len(), 2);
    assert!(temporal.iter().all(|v| v.severity == Severity::Critical && v.blocking));
    assert!(temporal.iter().all(|v| v.context["implemented_module"] == "presupuesto"));
    assert!(temporal.iter().all(|v| v.context["idle_module"] == "tiempo"));
    assert!(temporal[0]
        .message
        .starts_with("Module 'presupuesto' is implemented but its coupled module 'tiempo' is not"));
    assert!(temporal[1]
        .message
        .starts_with("Module 'tiempo' is not implemented but its coupled module 'presupuesto' is"));
    assert_eq!(result.status(), ValidationStatus::CriticalViolations);
}

#[test]
fn coupled_modules_without_freeze_services_warn() {
    let repo = tempdir().unwrap();
    presupuesto_module(repo.path());
    tiempo_module(repo.path());
    let roadmap = roadmap_file(repo.path(), COUPLED);

    let result = ValidationEngine::new(without_baseline()).validate(repo.path(), &roadmap);
    let temporal = temporal(&result);
    assert_eq!(temporal.len(), 2);
    assert!(temporal.iter().all(|v| v.severity == Severity::Warning && !v.blocking));
    assert_eq!(temporal[0].module_id, "presupuesto");
    assert_eq!(
        temporal[0].context["lacking_freeze"],
        serde_json::json!(["presupuesto", "tiempo"])
    );
    assert_eq!(
        temporal[1].context["lacking_freeze"],
        serde_json::json!(["tiempo", "presupuesto"])
    );
    assert_eq!(result.status(), ValidationStatus::Warnings);
}

#[test]
fn baseline_warns_when_the_encoded_pair_has_no_freeze_mechanism() {
    let repo = tempdir().unwrap();
    presupuesto_module(repo.path());
    tiempo_module(repo.path());
    let roadmap = roadmap_file(repo.path(), COUPLED);

    let result = ValidationEngine::default().validate(repo.path(), &roadmap);
    let temporal = temporal(&result);
    assert_eq!(temporal.len(), 3);
    let baseline: Vec<_> = temporal
        .iter()
        .filter(|v| v.message.contains("coupled freeze mechanism is missing"))
        .collect();
    assert_eq!(baseline.len(), 1);
    assert_eq!(baseline[0].module_id, "presupuesto");
    assert_eq!(baseline[0].severity, Severity::Warning);
    assert!(!baseline[0].blocking);
    assert_eq!(result.exit_code(false), 2);
}

#[test]
fn freeze_services_on_both_sides_satisfy_the_coupling() {
    let repo = tempdir().unwrap();
    presupuesto_module(repo.path());
    tiempo_module(repo.path());
    freeze_services(repo.path());
    let roadmap = roadmap_file(repo.path(), COUPLED);

    let result = ValidationEngine::default().validate(repo.path(), &roadmap);
    assert!(result
        .module_status("tiempo")
        .unwrap()
        .detected_services
        .iter()
        .any(|s| s.ends_with("FreezeCronogramaService")));
    assert!(result.violations.is_empty(), "{:?}", result.violations);
    assert_eq!(result.status(), ValidationStatus::Passed);
}

#[test]
fn unknown_dependency_is_a_critical_violation_not_an_error() {
    let repo = tempdir().unwrap();
    let roadmap = parse_roadmap(
        r#"{"version": "1.0.0", "modules": [
            {"id": "compras", "name": "Compras", "phase": "execution", "priority": "high", "dependencies": ["inventarios"]}
        ]}"#,
    )
    .unwrap();

    let result = ValidationEngine::new(without_baseline()).validate(repo.path(), &roadmap);
    assert_eq!(result.status(), ValidationStatus::CriticalViolations);
    assert_eq!(result.violations.len(), 1);
    assert_eq!(result.violations[0].context["missing_module"], "inventarios");
}

#[test]
fn broken_roadmap_collapses_to_an_error_result() {
    let repo = tempdir().unwrap();
    let roadmap = roadmap_file(repo.path(), "{ not json");

    let result = ValidationEngine::default().validate(repo.path(), &roadmap);
    assert_eq!(result.status(), ValidationStatus::Error);
    assert_eq!(result.exit_code(false), 3);
    assert_eq!(result.canonical_version, "unknown");
    assert_eq!(result.violations.len(), 1);
    assert_eq!(result.violations[0].module_id, "system");
    assert!(result.violations[0].message.starts_with("Validation failed:"));
    assert!(result.module_statuses.is_empty());

    let missing = FileRoadmap::new(repo.path().join("absent.json"));
    let result = ValidationEngine::default().validate(repo.path(), &missing);
    assert_eq!(result.status(), ValidationStatus::Error);
}

#[test]
fn unparsable_sources_are_skipped() {
    let repo = tempdir().unwrap();
    proyecto_entity(repo.path());
    write(
        repo.path(),
        &format!("{}/model/Broken.java", DOMAIN),
        "package com.budgetpro.domain.model;\n/* never closed\npublic final class Broken {}\n",
    );
    let roadmap = roadmap_file(repo.path(), PROYECTO_PRESUPUESTO);

    let result = ValidationEngine::new(without_baseline()).validate(repo.path(), &roadmap);
    assert_ne!(result.status(), ValidationStatus::Error);
    assert_eq!(
        result.module_status("proyecto").unwrap().detected_entities,
        vec!["com.budgetpro.domain.model.proyecto.Proyecto"]
    );
}

fn stable_json(result: &ValidationResult) -> Value {
    let mut json: Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
    let obj = json.as_object_mut().unwrap();
    obj.remove("validation_id");
    obj.remove("timestamp");
    json
}

#[test]
fn runs_are_idempotent_modulo_id_and_timestamp() {
    let repo = tempdir().unwrap();
    proyecto_entity(repo.path());
    presupuesto_module(repo.path());
    let roadmap = roadmap_file(repo.path(), PROYECTO_PRESUPUESTO);
    let engine = ValidationEngine::default();

    let first = engine.validate(repo.path(), &roadmap);
    let second = engine.validate(repo.path(), &roadmap);
    assert_ne!(first.validation_id, second.validation_id);
    assert_eq!(stable_json(&first), stable_json(&second));
}

#[test]
fn json_report_carries_the_wire_fields() {
    let repo = tempdir().unwrap();
    presupuesto_module(repo.path());
    let roadmap = roadmap_file(repo.path(), PROYECTO_PRESUPUESTO);

    let result = ValidationEngine::default().validate(repo.path(), &roadmap);
    let json: Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
    for key in [
        "validation_id",
        "timestamp",
        "repository_path",
        "canonical_version",
        "status",
        "violations",
        "module_statuses",
    ] {
        assert!(json.get(key).is_some(), "missing {}", key);
    }
    assert_eq!(json["canonical_version"], "1.0.0");
    assert_eq!(json["status"], "CRITICAL_VIOLATIONS");
    assert_eq!(json["module_statuses"][1]["implementation_status"], "COMPLETE");
    assert_eq!(json["violations"][0]["type"], "DATA_DEPENDENCY");
}
