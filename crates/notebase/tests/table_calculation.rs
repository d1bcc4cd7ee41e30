//! Tests for whole-table calculation and workspace files

use notebase::prelude::*;
use notebase::DerivedValue;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

const WORKSPACE_JSON: &str = r#"{
  "tables": [
    {
      "id": "tasks",
      "name": "Tasks",
      "columns": [
        { "id": "t-title", "name": "Title", "type": "text" },
        { "id": "t-hours", "name": "Hours", "type": "number" }
      ],
      "rows": [
        { "id": "t1", "cells": { "t-title": "Design", "t-hours": 3 } },
        { "id": "t2", "cells": { "t-title": "Build", "t-hours": 5 } }
      ]
    },
    {
      "id": "projects",
      "name": "Projects",
      "columns": [
        { "id": "p-name", "name": "Name", "type": "text" },
        {
          "id": "p-tasks",
          "name": "Tasks",
          "type": "relation",
          "options": { "kind": "relation", "relatedTableId": "tasks" }
        },
        {
          "id": "p-hours",
          "name": "Hours",
          "type": "rollup",
          "options": {
            "kind": "rollup",
            "relationColumnId": "p-tasks",
            "targetPropertyName": "Hours",
            "aggregation": "sum"
          }
        },
        {
          "id": "p-label",
          "name": "Label",
          "type": "formula",
          "options": {
            "kind": "formula",
            "source": "concat(prop(\"Name\"), \": \", prop(\"Hours\"), \"h\")"
          }
        },
        { "id": "p-todo", "name": "Todo", "type": "formula" }
      ],
      "rows": [
        { "id": "p1", "cells": { "p-name": "Launch", "p-tasks": ["t1", "t2"] } },
        { "id": "p2", "cells": { "p-name": "Idle" } }
      ]
    }
  ]
}"#;

#[test]
fn test_load_and_calculate() {
    let ws = Workspace::from_json(WORKSPACE_JSON).unwrap();
    let projects = ws.table("projects").unwrap();
    let calculation = TableCalculationExt::calculate(projects, &ws);

    let p1 = calculation.row("p1").unwrap();
    assert_eq!(p1.display("p-hours").unwrap(), "8");
    assert_eq!(p1.display("p-label").unwrap(), "Launch: 8h");
    assert!(matches!(p1.get("p-todo"), Some(DerivedValue::Formula(FormulaOutcome::Empty))));

    let p2 = calculation.row("p2").unwrap();
    assert_eq!(p2.display("p-hours").unwrap(), "Configure rollup");

    assert_eq!(calculation.stats.rows, 2);
    assert_eq!(calculation.stats.formula_columns, 2);
    assert_eq!(calculation.stats.rollup_columns, 1);
    // the rollup of p2 plus the blank formula in both rows
    assert_eq!(calculation.stats.unconfigured, 3);
    assert_eq!(calculation.stats.errors, 0);
}

#[test]
fn test_display_row() {
    let ws = Workspace::from_json(WORKSPACE_JSON).unwrap();
    let projects = ws.table("projects").unwrap();
    let calculation = TableCalculationExt::calculate(projects, &ws);

    let row = projects.row("p1").unwrap();
    let cells = projects.display_row(row, calculation.row("p1"));
    assert_eq!(cells, vec!["Launch", "t1, t2", "8", "Launch: 8h", ""]);
}

#[test]
fn test_workspace_calculate_stores_values() {
    let mut ws = Workspace::from_json(WORKSPACE_JSON).unwrap();
    let stats = WorkspaceCalculationExt::calculate(&mut ws).unwrap();
    assert_eq!(stats.rollup_columns, 1);

    let p1 = ws.table("projects").unwrap().row("p1").unwrap();
    assert_eq!(p1.get("p-hours"), Some(&CellValue::Number(8.0)));
    assert_eq!(p1.get("p-label"), Some(&CellValue::text("Launch: 8h")));
}

#[test]
fn test_save_and_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("workspace.json");

    let ws = Workspace::from_json(WORKSPACE_JSON).unwrap();
    ws.save(&path).unwrap();

    let reopened = Workspace::open(&path).unwrap();
    assert_eq!(reopened, ws);
}

#[test]
fn test_unsupported_extension() {
    let dir = tempdir().unwrap();
    let ws = Workspace::new();
    assert!(ws.save(dir.path().join("workspace.xlsx")).is_err());
    assert!(Workspace::open(dir.path().join("workspace.csv")).is_err());
}

#[test]
fn test_reject_duplicate_ids() {
    let json = r#"{ "tables": [
        { "id": "t", "name": "A" },
        { "id": "t", "name": "B" }
    ] }"#;
    assert!(matches!(
        Workspace::from_json(json),
        Err(Error::DuplicateTable(id)) if id == "t"
    ));

    let json = r#"{ "tables": [
        { "id": "t", "name": "A", "rows": [ { "id": "r" }, { "id": "r" } ] }
    ] }"#;
    assert!(matches!(Workspace::from_json(json), Err(Error::DuplicateRow(_))));
}

#[test]
fn test_invalid_json() {
    assert!(Workspace::from_json("{ not json").is_err());
}
