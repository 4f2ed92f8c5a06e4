fn main() {
    println!("Run `cargo test -p install-compat` to execute installation compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};

    use steamconfig_install::{InstallationView, PathKind, Paths, SteamError};
    use steamconfig_vdf::binary::{TYPE_END, TYPE_INT32, TYPE_SECTION, TYPE_STRING};
    use steamconfig_vdf::{Node, appinfo, generate_app_id, text};

    const ACCOUNT_ID: &str = "22202";

    const TEXT_FIXTURES: &[&str] = &[
        "registry.vdf",
        "loginusers.vdf",
        "config.vdf",
        "sharedconfig.vdf",
        "localconfig.vdf",
        "appmanifest_10.acf",
        "appmanifest_20.acf",
        "appmanifest_30.acf",
        "appmanifest_40.acf",
    ];

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    fn load_fixture(name: &str) -> Vec<u8> {
        let path = fixtures_dir().join(name);
        fs::read(&path).unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    fn install_fixture(name: &str, dest: &Path) {
        fs::create_dir_all(dest.parent().unwrap()).unwrap();
        fs::write(dest, load_fixture(name)).unwrap();
    }

    /// Binary KV writer for the appinfo and shortcuts images.
    #[derive(Default)]
    struct Kv(Vec<u8>);

    impl Kv {
        fn section(mut self, key: &str) -> Self {
            self.0.push(TYPE_SECTION);
            self.cstr(key);
            self
        }

        fn string(mut self, key: &str, value: &str) -> Self {
            self.0.push(TYPE_STRING);
            self.cstr(key);
            self.cstr(value);
            self
        }

        fn int32(mut self, key: &str, value: i32) -> Self {
            self.0.push(TYPE_INT32);
            self.cstr(key);
            self.0.extend_from_slice(&value.to_le_bytes());
            self
        }

        fn end(mut self) -> Self {
            self.0.push(TYPE_END);
            self
        }

        fn cstr(&mut self, s: &str) {
            self.0.extend_from_slice(s.as_bytes());
            self.0.push(0x00);
        }
    }

    fn appinfo_image(apps: &[(u32, &str)]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&appinfo::MAGIC_V27.to_le_bytes());
        out.extend_from_slice(&1u32.to_le_bytes());
        for &(app_id, name) in apps {
            let tree = Kv::default()
                .section("appinfo")
                .int32("appid", app_id as i32)
                .section("common")
                .string("name", name)
                .string("type", "Game")
                .end()
                .end()
                .end()
                .0;

            let mut body = Vec::new();
            body.extend_from_slice(&2u32.to_le_bytes()); // info_state
            body.extend_from_slice(&1_700_000_000u32.to_le_bytes());
            body.extend_from_slice(&0u64.to_le_bytes()); // access_token
            body.extend_from_slice(&[0xab; 20]);
            body.extend_from_slice(&7u32.to_le_bytes()); // change_number
            body.extend_from_slice(&tree);

            out.extend_from_slice(&app_id.to_le_bytes());
            out.extend_from_slice(&(body.len() as u32).to_le_bytes());
            out.extend_from_slice(&body);
        }
        out.extend_from_slice(&0u32.to_le_bytes());
        out
    }

    fn shortcuts_image() -> Vec<u8> {
        Kv::default()
            .section("shortcuts")
            .section("0")
            .string("AppName", "Celeste")
            .string("Exe", "\"/games/celeste/Celeste\"")
            .string("StartDir", "\"/games/celeste/\"")
            .int32("IsHidden", 0)
            .int32("AllowOverlay", 1)
            .int32("LastPlayTime", 1_700_000_000)
            .section("tags")
            .string("0", "Platformer")
            .string("1", "Indie")
            .end()
            .end()
            .end()
            .end()
            .0
    }

    /// A Steam root with two extra libraries next to it in `tmp`.
    struct FakeSteam {
        _tmp: tempfile::TempDir,
        paths: Paths,
    }

    fn fake_steam() -> FakeSteam {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("steam");
        let lib_a = tmp.path().join("library-a");
        let lib_b = tmp.path().join("library-b");
        let paths = Paths::with_base(&root);

        install_fixture("registry.vdf", &paths.registry_path());
        install_fixture("loginusers.vdf", &paths.login_users_path());
        install_fixture("config.vdf", &paths.config_path());
        install_fixture("sharedconfig.vdf", &paths.shared_config_path(ACCOUNT_ID));
        install_fixture("localconfig.vdf", &paths.local_config_path(ACCOUNT_ID));

        for (library, app_id) in [(&lib_a, 20), (&lib_a, 10), (&lib_b, 30), (&root, 40)] {
            let name = format!("appmanifest_{app_id}.acf");
            install_fixture(&name, &library.join("steamapps").join(&name));
        }

        let library_folders = format!(
            "\"LibraryFolders\"\n{{\n\t\"TimeNextStatsReport\"\t\t\"1561832478\"\n\t\"ContentStatsID\"\t\t\"-158337411110787451\"\n\t\"1\"\t\t\"{}\"\n\t\"2\"\t\t\"{}\"\n}}\n",
            lib_a.display(),
            lib_b.display()
        );
        fs::write(paths.library_folders_path(), library_folders).unwrap();

        fs::create_dir_all(paths.app_cache_dir()).unwrap();
        fs::write(
            paths.app_info_path(),
            appinfo_image(&[(440, "Team Fortress 2"), (620, "Portal 2")]),
        )
        .unwrap();

        FakeSteam { _tmp: tmp, paths }
    }

    fn write_shortcuts(paths: &Paths) {
        let path = paths.shortcuts_path(ACCOUNT_ID);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, shortcuts_image()).unwrap();
    }

    fn load_everything(paths: &Paths) -> InstallationView {
        let mut view = InstallationView::new();
        view.set_install_path(paths.base_dir()).unwrap();
        view.load_registry().unwrap();
        view.load_login_users().unwrap();
        view.set_user().unwrap();
        view.load_library_folders().unwrap();
        view.load_steam_apps().unwrap();
        view.load_config().unwrap();
        view.load_app_info().unwrap();
        view.load_shared_config().unwrap();
        view.load_local_config().unwrap();
        view.load_shortcuts().unwrap();
        view
    }

    #[test]
    fn text_fixtures_parse_and_reprint() {
        for name in TEXT_FIXTURES {
            let parsed = text::parse(&load_fixture(name))
                .unwrap_or_else(|e| panic!("failed to parse fixture {name}: {e}"));
            assert_eq!(parsed.len(), 1, "{name} should have one root section");

            let printed = text::stringify(&parsed, true);
            let reparsed = text::parse_str(&printed).unwrap();
            assert_eq!(reparsed, parsed, "{name} changed after reprinting");
        }
    }

    #[test]
    fn full_load_sequence() {
        let steam = fake_steam();
        write_shortcuts(&steam.paths);
        let view = load_everything(&steam.paths);

        let user = view.active_user().expect("active user");
        assert_eq!(user.steam_id, 76561197960287930);
        assert_eq!(user.account_id, 22202);
        assert_eq!(user.record.get_str("PersonaName"), Some("Gabe"));

        assert_eq!(view.library_folders().map(<[_]>::len), Some(2));

        let app_ids: Vec<u64> = view
            .app_manifests()
            .unwrap()
            .iter()
            .map(|m| m.get("appid").and_then(Node::as_u64).unwrap())
            .collect();
        assert_eq!(app_ids, vec![10, 20, 30, 40]);

        let app_info = view.app_info().unwrap();
        assert_eq!(app_info.len(), 2);
        assert_eq!(app_info[0].app_id, 440);
        assert_eq!(app_info[0].common_name(), Some("Team Fortress 2"));
        assert_eq!(app_info[1].common_name(), Some("Portal 2"));
        assert_eq!(app_info[1].change_number, 7);

        let config = view.config().unwrap();
        assert_eq!(
            config
                .get_path(&[
                    "InstallConfigStore",
                    "Software",
                    "Valve",
                    "Steam",
                    "CompatToolMapping",
                    "440",
                    "name"
                ])
                .and_then(Node::as_str),
            Some("proton_experimental")
        );

        let local = view.local_config().unwrap();
        assert_eq!(
            local
                .get_path(&["UserLocalConfigStore", "friends", "PersonaName"])
                .and_then(Node::as_str),
            Some("Gabe")
        );

        let shortcuts = view.shortcuts().unwrap();
        assert_eq!(shortcuts.len(), 1);
        let celeste = &shortcuts[0];
        assert_eq!(celeste.app_name, "Celeste");
        assert_eq!(
            celeste.app_id,
            generate_app_id("\"/games/celeste/Celeste\"", "Celeste")
        );
        assert!(celeste.allow_overlay);
        assert!(!celeste.is_hidden);
        assert_eq!(celeste.tags, vec!["Platformer", "Indie"]);
        assert_eq!(
            celeste.last_play_time.map(|t| t.timestamp()),
            Some(1_700_000_000)
        );

        let categories = view.categories().unwrap();
        assert_eq!(categories.labels, vec!["Action", "RPG"]);
        assert_eq!(categories.tagged_apps, 2);
    }

    #[test]
    fn shortcuts_are_optional() {
        let steam = fake_steam();
        let view = load_everything(&steam.paths);
        assert_eq!(view.shortcuts().map(<[_]>::len), Some(0));
    }

    #[test]
    fn path_to_follows_active_user() {
        let steam = fake_steam();
        let view = load_everything(&steam.paths);
        let paths = &steam.paths;

        assert_eq!(view.path_to(PathKind::AppInfo).unwrap(), paths.app_cache_dir());
        assert_eq!(view.path_to(PathKind::SteamApps).unwrap(), paths.steamapps_dir());
        assert_eq!(
            view.path_to(PathKind::SharedConfig).unwrap(),
            paths.shared_config_path(ACCOUNT_ID)
        );
        assert_eq!(
            view.path_to(PathKind::Shortcuts).unwrap(),
            paths.shortcuts_path(ACCOUNT_ID)
        );
    }

    #[test]
    fn missing_library_fails_app_merge() {
        let steam = fake_steam();
        fs::remove_dir_all(steam.paths.base_dir().with_file_name("library-b")).unwrap();

        let mut view = InstallationView::new();
        view.set_install_path(steam.paths.base_dir()).unwrap();
        view.load_library_folders().unwrap();
        assert!(matches!(
            view.load_steam_apps(),
            Err(SteamError::NotFound(_))
        ));
        assert!(view.app_manifests().is_none());
    }

    #[test]
    fn corrupt_appinfo_is_a_format_error() {
        let steam = fake_steam();
        let path = steam.paths.app_info_path();
        let mut image = fs::read(&path).unwrap();
        image.truncate(image.len() - 30);
        fs::write(&path, image).unwrap();

        let mut view = InstallationView::new();
        view.set_install_path(steam.paths.base_dir()).unwrap();
        let err = view.load_app_info().unwrap_err();
        assert!(err.is_format_error(), "unexpected error: {err}");
        assert!(err.to_string().contains("appinfo.vdf"));
    }

    #[test]
    fn edited_local_config_survives_reload() {
        let steam = fake_steam();
        let mut view = load_everything(&steam.paths);

        let mut local = view.local_config().unwrap().clone();
        let mut store = local.get_section("UserLocalConfigStore").unwrap().clone();
        store.insert("Marker", "kept");
        local.insert("UserLocalConfigStore", store);
        let path = view.path_to(PathKind::LocalConfig).unwrap();
        steamconfig_install::save_text_vdf(&path, &local).unwrap();

        view.load_local_config().unwrap();
        assert_eq!(view.local_config(), Some(&local));
    }
}
