use terrane_content::builtin;
use terrane_content::config::{NodeDef, NodesConfig};
use terrane_content::{
    CONTENT_AIR, CONTENT_IGNORE, ContentDefs, ContentRegistry, LiquidType, ParamType,
};

#[test]
fn reserved_entries_present() {
    let reg = ContentRegistry::new();
    let air = reg.get(CONTENT_AIR);
    assert_eq!(air.name, "air");
    assert!(air.light_propagates && air.sunlight_propagates);
    assert_eq!(air.param_type, ParamType::Light);
    let ignore = reg.get(CONTENT_IGNORE);
    assert!(!ignore.light_propagates && !ignore.sunlight_propagates);
    assert_eq!(reg.id_by_name("ignore"), Some(CONTENT_IGNORE));
}

#[test]
fn unregistered_ids_resolve_to_unknown() {
    let reg = ContentRegistry::new();
    assert!(!reg.is_registered(500));
    let f = reg.get(500);
    assert_eq!(f.name, "unknown");
    assert!(!f.light_propagates);
}

#[test]
fn builtin_liquids_point_at_each_other() {
    let reg = ContentRegistry::builtin();
    let src = reg.get(builtin::WATER_SOURCE);
    assert_eq!(src.liquid_type, LiquidType::Source);
    assert_eq!(src.liquid_alternative_flowing, builtin::WATER_FLOWING);
    let flow = reg.get(builtin::WATER_FLOWING);
    assert_eq!(flow.liquid_alternative_source, builtin::WATER_SOURCE);
    assert!(reg.get(builtin::LAVA_SOURCE).liquid_viscosity > 1);
    assert_eq!(reg.get(builtin::CHEST).metadata_name.as_deref(), Some("chest"));
}

#[test]
fn toml_definitions_resolve_forward_references() {
    let reg = ContentRegistry::from_toml_str(
        r#"
        [[nodes]]
        name = "oil_source"
        id = 40
        param_type = "light"
        light_propagates = true
        liquid_type = "source"
        liquid_alternative_flowing = "oil_flowing"
        liquid_alternative_source = "oil_source"
        liquid_viscosity = 3

        [[nodes]]
        name = "oil_flowing"
        id = 41
        param_type = "light"
        light_propagates = true
        liquid_type = "flowing"
        liquid_alternative_flowing = "oil_flowing"
        liquid_alternative_source = "oil_source"
        liquid_viscosity = 3
    "#,
    )
    .expect("registry");
    assert_eq!(reg.get(40).liquid_alternative_flowing, 41);
    assert_eq!(reg.get(41).liquid_alternative_source, 40);
    assert_eq!(reg.get(41).liquid_viscosity, 3);
    assert_eq!(reg.ids().collect::<Vec<_>>(), vec![40, 41, CONTENT_AIR, CONTENT_IGNORE]);
}

#[test]
fn rejects_reserved_and_duplicate_ids() {
    let reserved = NodesConfig {
        nodes: vec![NodeDef {
            name: "fake_air".into(),
            id: CONTENT_AIR,
            ..NodeDef::default()
        }],
        extend_builtin: None,
    };
    assert!(ContentRegistry::from_configs(reserved).is_err());

    let dup = NodesConfig {
        nodes: vec![
            NodeDef {
                name: "a".into(),
                id: 1,
                ..NodeDef::default()
            },
            NodeDef {
                name: "b".into(),
                id: 1,
                ..NodeDef::default()
            },
        ],
        extend_builtin: None,
    };
    assert!(ContentRegistry::from_configs(dup).is_err());
}

#[test]
fn rejects_unknown_alternative_and_overbright_source() {
    let bad_alt = ContentRegistry::from_toml_str(
        r#"
        [[nodes]]
        name = "goo"
        id = 3
        liquid_type = "flowing"
        liquid_alternative_source = "nope"
    "#,
    );
    assert!(bad_alt.is_err());

    let bright = ContentRegistry::from_toml_str(
        r#"
        [[nodes]]
        name = "sun_lamp"
        id = 3
        light_source = 15
    "#,
    );
    assert!(bright.is_err());
}

#[test]
fn extend_builtin_layers_new_content() {
    let reg = ContentRegistry::from_toml_str(
        r#"
        extend_builtin = true
        [[nodes]]
        name = "mese_lamp"
        id = 60
        param_type = "light"
        light_propagates = true
        light_source = 10
    "#,
    )
    .expect("registry");
    assert_eq!(reg.id_by_name("stone"), Some(builtin::STONE));
    assert_eq!(reg.get(60).light_source, 10);
}
