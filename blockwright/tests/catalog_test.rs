use blockwright::*;

#[test]
fn test_turbine_dynamo_catalog() {
    let catalog = Catalog::turbine_dynamo().unwrap();
    assert_eq!(catalog.len(), 9);
    assert_eq!(catalog.find("air").unwrap(), 0);
    assert_eq!(catalog.ids_of_type("coil").len(), 6);

    let silver = catalog.get(catalog.find("silver coil").unwrap()).unwrap();
    assert_eq!(silver.conductivity(), 1.12);
    assert_eq!(silver.placement_rule, "one gold coil && one copper coil");
}

#[test]
fn test_accelerator_catalog() {
    let catalog = Catalog::accelerator().unwrap();
    assert_eq!(catalog.len(), 46);
    assert_eq!(catalog.ids_of_type("cavity"), vec![4, 5, 6, 7, 8]);
    assert_eq!(catalog.ids_of_type("magnet"), vec![9, 10, 11, 12, 13]);
    assert_eq!(catalog.ids_of_type("cooler").len(), 32);

    let beam = catalog.get(catalog.find("beam").unwrap()).unwrap();
    assert_eq!(beam.attenuation(), 0.02);
    let cavity = catalog.get(catalog.find("bscco cavity").unwrap()).unwrap();
    assert_eq!(cavity.voltage(), 4000);
    assert!(cavity.is_powered());
}

#[test]
fn test_builtin_rules_parse() {
    for catalog in [
        Catalog::turbine_dynamo().unwrap(),
        Catalog::accelerator().unwrap(),
        Catalog::nucleosynthesis().unwrap(),
        Catalog::turbine_rotor().unwrap(),
    ] {
        let rules = catalog.parse_rules().unwrap();
        assert_eq!(rules.len(), catalog.len());
        for (component, rule) in catalog.iter().zip(&rules) {
            assert_eq!(
                component.placement_rule.is_empty(),
                rule.is_empty(),
                "{}",
                component
            );
        }
    }
}

#[test]
fn test_nucleosynthesis_catalog() {
    let catalog = Catalog::nucleosynthesis().unwrap();
    assert_eq!(catalog.len(), 13);
    assert_eq!(catalog.ids_of_type("heater").len(), 8);
    let nozzle = catalog.get(catalog.find("nozzle").unwrap()).unwrap();
    assert_eq!((nozzle.heat(), nozzle.power()), (500, 1000));
    let diamond = catalog.get(catalog.find("diamond heater").unwrap()).unwrap();
    assert_eq!(diamond.cooling(), 640);
    assert!(!diamond.is_powered());
}

#[test]
fn test_turbine_rotor_catalog() {
    let catalog = Catalog::turbine_rotor().unwrap();
    assert_eq!(catalog.ids_of_type("blade"), vec![0, 1, 2, 3]);
    let stator = catalog.get(catalog.find("stator").unwrap()).unwrap();
    assert_eq!(stator.expansion(), 0.75);
    assert_eq!(stator.efficiency(), 0.0);
    let blade = catalog.get(catalog.find("super blade").unwrap()).unwrap();
    assert_eq!((blade.efficiency(), blade.expansion()), (1.25, 1.9));
}

#[test]
fn test_json_round_trip_keeps_order() {
    let catalog = Catalog::accelerator().unwrap();
    let json = catalog.to_json().unwrap();
    assert_eq!(Catalog::from_json(&json).unwrap(), catalog);
}

#[test]
fn test_custom_catalog_from_json() {
    let catalog = Catalog::from_json(
        r#"[
            {"type": "air"},
            {"type": "casing"},
            {"type": "bearing"},
            {"name": "tin", "type": "coil", "conductivity": 0.5, "placement_rule": "two bearings"}
        ]"#,
    )
    .unwrap();
    let tin = catalog.get(3).unwrap();
    assert_eq!(tin.full_name(), "tin coil");
    assert_eq!(tin.to_string(), "tin coil");
    assert_eq!(catalog.require_type("bearing").unwrap(), vec![2]);
    assert!(catalog.require_type("yoke").is_err());
}

#[test]
fn test_same_name_different_type_is_allowed() {
    let catalog = Catalog::new(vec![
        Component::new("copper", ComponentKind::Coil { conductivity: 1.06 }),
        Component::new("copper", ComponentKind::Cooler { cooling: 80 }),
    ])
    .unwrap();
    assert_eq!(catalog.find("copper cooler").unwrap(), 1);
}

#[test]
fn test_default_beam_attenuation() {
    let catalog = Catalog::from_json(r#"[{"type": "beam"}, {"type": "beam", "name": "lossy", "attenuation": 0.5}]"#)
        .unwrap();
    assert_eq!(catalog.get(0).unwrap().attenuation(), 0.02);
    assert_eq!(catalog.get(1).unwrap().attenuation(), 0.5);
}
