use cfg_aliases::cfg_aliases;
use gl_generator::{Api, Fallbacks, GlobalGenerator, Profile, Registry};
use std::{env, fs::File, path::PathBuf};

fn main() {
    cfg_aliases! {
        macos_platform: { target_os = "macos" },
        free_unix: { all(unix, not(target_os = "macos"), not(target_os = "android")) },
    }

    let dest = PathBuf::from(env::var("OUT_DIR").unwrap());
    println!("cargo:rerun-if-changed=build.rs");

    let mut file = File::create(dest.join("gl_bindings.rs")).unwrap();
    Registry::new(Api::Gl, (3, 3), Profile::Core, Fallbacks::All, [])
        .write_bindings(GlobalGenerator, &mut file)
        .unwrap();
}
