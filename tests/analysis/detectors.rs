use canon_validator::analysis::source::{self, SourceRoot};
use canon_validator::analysis::transitions::{check_transitions, FindingKind, TransitionRules};
use canon_validator::analysis::AnalysisSnapshot;
use canon_validator::core::config::{LayoutConfig, ValidatorConfig};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const DOMAIN: &str = "src/main/java/com/budgetpro/domain";
const INFRA: &str = "src/main/java/com/budgetpro/infrastructure";

fn write(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

fn backend(root: &Path) {
    write(
        root,
        &format!("{}/model/presupuesto/Presupuesto.java", DOMAIN),
        r#"package com.budgetpro.domain.model.presupuesto;

import java.util.List;

/**
 * Agregado raíz del presupuesto.
 */
public class Presupuesto {
    private static final String TIPO = "if (x) { this.estado = EstadoPresupuesto.CERRADO; }";
    private EstadoPresupuesto estado;
    private List<Partida> partidas;
    private ProyectoId proyectoId;

    public Presupuesto(ProyectoId proyectoId) {
        this.proyectoId = proyectoId;
        this.estado = EstadoPresupuesto.BORRADOR;
    }

    public void aprobar() {
        if (this.estado == EstadoPresupuesto.BORRADOR) {
            this.estado = EstadoPresupuesto.APROBADO;
        }
    }

    public void congelar() {
        if (EstadoPresupuesto.CONGELADO.equals(this.estado)) {
            this.estado = EstadoPresupuesto.BORRADOR;
        }
    }

    public void archivar() {
        this.estado = EstadoPresupuesto.ARCHIVADO;
    }
}
"#,
    );
    write(
        root,
        &format!("{}/model/presupuesto/EstadoPresupuesto.java", DOMAIN),
        "package com.budgetpro.domain.model.presupuesto;\n\npublic enum EstadoPresupuesto {\n    BORRADOR(\"b\"),\n    APROBADO(\"a\"),\n    CONGELADO(\"c\");\n\n    private final String code;\n    EstadoPresupuesto(String code) { this.code = code; }\n}\n",
    );
    write(
        root,
        &format!("{}/model/presupuesto/NaturalezaGasto.java", DOMAIN),
        "package com.budgetpro.domain.model.presupuesto;\n\npublic enum NaturalezaGasto { DIRECTO, INDIRECTO }\n",
    );
    write(
        root,
        &format!("{}/model/presupuesto/Partida.java", DOMAIN),
        "package com.budgetpro.domain.model.presupuesto;\n\npublic final class Partida {\n    private NaturalezaGasto naturaleza;\n}\n",
    );
    write(
        root,
        &format!("{}/port/out/PresupuestoRepository.java", DOMAIN),
        "package com.budgetpro.domain.port.out;\n\npublic interface PresupuestoRepository {\n    void save(Presupuesto p);\n}\n",
    );
    write(
        root,
        &format!("{}/service/CongelarPresupuestoService.java", DOMAIN),
        "package com.budgetpro.domain.service;\n\npublic class CongelarPresupuestoService {\n    public void congelar() {}\n    public static CongelarPresupuestoService create() { return null; }\n    private void audit() {}\n}\n",
    );
    write(
        root,
        &format!("{}/persistence/PresupuestoJpaAdapter.java", INFRA),
        "package com.budgetpro.infrastructure.persistence;\n\npublic class PresupuestoJpaAdapter implements PresupuestoRepository {}\n",
    );
    write(
        root,
        &format!("{}/persistence/AbstractAdapter.java", INFRA),
        "package com.budgetpro.infrastructure.persistence;\n\npublic abstract class AbstractAdapter {}\n",
    );
    write(
        root,
        &format!("{}/rest/PresupuestoController.java", INFRA),
        r#"package com.budgetpro.infrastructure.rest;

@RestController
@RequestMapping(value = "/api/v1/presupuestos/")
public class PresupuestoController {
    @GetMapping
    public Object list() { return null; }

    @PostMapping("/{id}/aprobar")
    public Object aprobar() { return null; }

    @DeleteMapping(path = "{id}")
    public Object delete() { return null; }

    public Object helper() { return null; }
}
"#,
    );
    write(
        root,
        &format!("{}/target/Generated.java", DOMAIN),
        "package com.budgetpro.domain.target;\npublic final class Generated {}\n",
    );
}

#[test]
fn snapshot_collects_every_fact_family() {
    let repo = tempdir().unwrap();
    backend(repo.path());
    let snapshot = AnalysisSnapshot::build(repo.path(), &ValidatorConfig::default()).unwrap();

    assert_eq!(
        snapshot.entities,
        vec![
            "com.budgetpro.domain.model.presupuesto.Partida",
            "com.budgetpro.domain.model.presupuesto.Presupuesto",
        ]
    );
    assert_eq!(
        snapshot.services["com.budgetpro.domain.service.CongelarPresupuestoService"],
        vec!["congelar"]
    );
    assert_eq!(
        snapshot.endpoints["PresupuestoController"],
        vec![
            "GET /api/v1/presupuestos/",
            "POST /api/v1/presupuestos/{id}/aprobar",
            "DELETE /api/v1/presupuestos/{id}",
        ]
    );
    assert_eq!(
        snapshot.state_machines["EstadoPresupuesto"],
        vec!["BORRADOR", "APROBADO", "CONGELADO"]
    );
    assert!(!snapshot.state_machines.contains_key("NaturalezaGasto"));
    assert_eq!(snapshot.enums["com.budgetpro.domain.model.presupuesto.NaturalezaGasto"], vec!["DIRECTO", "INDIRECTO"]);
    assert_eq!(snapshot.ports, vec!["com.budgetpro.domain.port.out.PresupuestoRepository"]);
    assert_eq!(snapshot.adapters, vec!["com.budgetpro.infrastructure.persistence.PresupuestoJpaAdapter"]);

    let related = &snapshot.relationships["com.budgetpro.domain.model.presupuesto.Presupuesto"];
    assert!(related.contains("Partida"));
    assert!(!related.contains("ProyectoId"));
    assert!(!related.contains("String"));
}

#[test]
fn skipped_directories_are_never_walked() {
    let repo = tempdir().unwrap();
    backend(repo.path());
    let tree = source::scan(repo.path(), &LayoutConfig::default()).unwrap();
    assert!(tree.units.iter().all(|u| !u.path.to_string_lossy().contains("/target/")));

    let rest: Vec<_> = tree.units_in(SourceRoot::Api).collect();
    assert_eq!(rest.len(), 1);
    assert!(rest[0].in_root(SourceRoot::Infrastructure));
    assert!(!rest[0].in_root(SourceRoot::Domain));
    assert!(tree.units.windows(2).all(|w| w[0].path != w[1].path));
}

#[test]
fn state_assignments_infer_origin_from_guards() {
    let repo = tempdir().unwrap();
    backend(repo.path());
    let snapshot = AnalysisSnapshot::build(repo.path(), &ValidatorConfig::default()).unwrap();

    let by_method = |name: &str| {
        snapshot
            .state_assignments
            .iter()
            .find(|a| a.method == name)
            .unwrap_or_else(|| panic!("no assignment in {}", name))
    };
    let aprobar = by_method("aprobar");
    assert_eq!(aprobar.from_state.as_deref(), Some("BORRADOR"));
    assert_eq!(aprobar.to_state, "APROBADO");
    assert_eq!(aprobar.field, "estado");
    assert!(aprobar.valid);

    let congelar = by_method("congelar");
    assert_eq!(congelar.from_state.as_deref(), Some("CONGELADO"));

    let archivar = by_method("archivar");
    assert_eq!(archivar.from_state, None);
    assert!(!archivar.valid);

    // Constructors and string literals never produce assignments.
    assert!(snapshot.state_assignments.iter().all(|a| a.to_state != "CERRADO"));
    assert_eq!(snapshot.state_assignments.len(), 3);
}

#[test]
fn transition_rules_classify_scanned_assignments() {
    let repo = tempdir().unwrap();
    backend(repo.path());
    let snapshot = AnalysisSnapshot::build(repo.path(), &ValidatorConfig::default()).unwrap();
    let rules = TransitionRules::from_toml_str(
        r#"
[[state_machines]]
class_fqn = "com.budgetpro.domain.model.presupuesto.Presupuesto"
state_field = "estado"
state_enum = "EstadoPresupuesto"
initial_state = "BORRADOR"
terminal_states = ["CONGELADO"]

[state_machines.transitions]
BORRADOR = ["APROBADO"]
APROBADO = ["CONGELADO"]
"#,
    )
    .unwrap();

    let findings = check_transitions(&snapshot.state_assignments, &rules);
    let kinds: Vec<_> = findings.iter().map(|f| (f.method.as_str(), f.kind)).collect();
    assert_eq!(
        kinds,
        vec![
            ("congelar", FindingKind::InvalidTransition),
            ("archivar", FindingKind::NonExistentState),
        ]
    );
}
