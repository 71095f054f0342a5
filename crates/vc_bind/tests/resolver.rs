//! Resolver configuration, caching and registration.

use std::any::TypeId;

use vc_bind::{
    Access, AccessError, Bindable, CacheStats, ResetMode, ResolveError, Resolver, ResolverConfig,
};

#[derive(Bindable, Clone, Debug, Default, PartialEq)]
#[bind(default)]
struct Stats {
    health: u32,
    speed: f32,
}

#[derive(Bindable, Clone, Default)]
#[bind(default, auto_register)]
struct Player {
    name: String,
    stats: Stats,
    backup: Option<Stats>,
    #[bind(skip)]
    #[allow(dead_code)]
    secret: u64,
    #[bind(rename = "nick")]
    nickname: String,
}

fn resolver(config: ResolverConfig) -> Resolver {
    let mut resolver = Resolver::with_config(config);
    resolver.register::<Player>();
    resolver
}

#[test]
fn member_paths_follow_wrappers() {
    let resolver = resolver(ResolverConfig::default());
    assert_eq!(
        resolver.member_paths(TypeId::of::<Player>()),
        [
            "name",
            "name.len",
            "stats",
            "stats.health",
            "stats.speed",
            "backup",
            "backup.health",
            "backup.speed",
            "nick",
            "nick.len",
        ]
    );
}

#[test]
fn skipped_and_renamed_fields() {
    let mut resolver = resolver(ResolverConfig::default());
    assert!(matches!(
        resolver.resolve_of::<Player>("secret").unwrap_err(),
        ResolveError::UnresolvableSegment { .. }
    ));
    assert!(resolver.resolve_of::<Player>("nickname").is_err());

    let nick = resolver.resolve_as::<Player, String>("nick").unwrap();
    let mut player = Player::default();
    nick.set(&mut player, String::from("ace")).unwrap();
    assert_eq!(player.nickname, "ace");
}

#[test]
fn registered_accessors_take_precedence() {
    let mut resolver = resolver(ResolverConfig::default());
    let speed = resolver.resolve_of::<Player>("stats.speed").unwrap();
    resolver.register_accessor("stats.health", speed).unwrap();

    let health = resolver.resolve_of::<Player>(" stats . health ").unwrap();
    assert!(health.value_type().is::<f32>());

    let again = resolver.resolve_of::<Player>("name").unwrap();
    let conflict = resolver.register_accessor("stats.health", again).unwrap_err();
    assert_eq!(conflict.path, "stats.health");
    assert!(conflict.ty.is::<Player>());

    resolver.reset(ResetMode::KeepRegistered);
    let health = resolver.resolve_of::<Player>("stats.health").unwrap();
    assert!(health.value_type().is::<f32>());

    resolver.reset(ResetMode::All);
    let health = resolver.resolve_of::<Player>("stats.health").unwrap();
    assert!(health.value_type().is::<u32>());
}

#[test]
fn reset_clears_templates_and_counters() {
    let mut resolver = resolver(ResolverConfig::default());
    resolver.resolve_of::<Player>("stats.health").unwrap();
    resolver.resolve_of::<Player>("stats.health").unwrap();
    resolver.resolve_of::<Player>("name").unwrap();
    assert_eq!(
        resolver.cache_stats(),
        CacheStats {
            hits: 1,
            misses: 2,
            templates: 2,
            registered: 0,
        }
    );

    resolver.reset(ResetMode::KeepRegistered);
    assert_eq!(resolver.cache_stats(), CacheStats::default());

    resolver.resolve_of::<Player>("name").unwrap();
    assert_eq!(resolver.cache_stats().misses, 1);
}

#[test]
fn safe_mode_reads_defaults() {
    let mut resolver = resolver(ResolverConfig::default().with_safe_mode(true));
    let health = resolver.resolve_as::<Player, u32>("backup?.health").unwrap();
    let backup = resolver.resolve_as::<Player, Stats>("backup?").unwrap();

    let mut player = Player::default();
    assert_eq!(health.get(&player).unwrap(), 0);
    assert_eq!(backup.get(&player).unwrap(), Stats::default());

    // Write errors still surface.
    assert!(matches!(
        health.set(&mut player, 5).unwrap_err(),
        AccessError::NullValue { .. }
    ));

    player.backup = Some(Stats {
        health: 7,
        speed: 1.0,
    });
    assert_eq!(health.get(&player).unwrap(), 7);
    health.set(&mut player, 9).unwrap();
    assert_eq!(player.backup.as_ref().map(|s| s.health), Some(9));
}

#[test]
fn unresolvable_paths_can_fall_back_to_the_root() {
    let mut strict = resolver(ResolverConfig::default());
    assert!(strict.resolve_of::<Player>("stats.mana").is_err());

    let mut lenient = resolver(ResolverConfig::default().with_fallback_to_self(true));
    let root = lenient.resolve_of::<Player>("stats.mana").unwrap();
    assert!(root.value_type().is::<Player>());

    let player = Player {
        name: String::from("bo"),
        ..Player::default()
    };
    let value = root.get_value(&player).unwrap();
    assert_eq!(value.downcast_ref::<Player>().map(|p| p.name.as_str()), Some("bo"));

    // Syntax errors are never recovered.
    assert!(matches!(
        lenient.resolve_of::<Player>("stats..mana").unwrap_err(),
        ResolveError::Parse(_)
    ));
}

#[test]
fn unregistered_roots_fail() {
    let mut resolver = Resolver::new();
    assert!(matches!(
        resolver.resolve_of::<Player>("name").unwrap_err(),
        ResolveError::UnregisteredType { .. }
    ));
}

#[cfg(feature = "auto_register")]
#[test]
fn auto_registration_picks_up_marked_types() {
    let mut resolver = Resolver::new();
    assert!(resolver.auto_register());
    let name = resolver.resolve_as::<Player, String>("name").unwrap();
    let mut player = Player::default();
    name.set(&mut player, String::from("cy")).unwrap();
    assert_eq!(player.name, "cy");
}
