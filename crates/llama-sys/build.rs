use std::env;
use std::path::{Path, PathBuf};

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let llama_cpp_dir = env::var("LLAMA_CPP_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| manifest_dir.join("../../third_party/llama.cpp"));
    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    let backend_dl = env::var("CARGO_FEATURE_BACKEND_DL").is_ok();

    println!("cargo:rerun-if-env-changed=LLAMA_CPP_DIR");
    println!("cargo:rerun-if-env-changed=LLAMA_PREBUILT_DIR");

    // ── Determine build mode ──────────────────────────────────────────
    //
    // Mode A, **Prebuilt**: `LLAMA_PREBUILT_DIR` points at an install
    //   tree with `lib/` and `include/`; only linking + bindgen run.
    //   Use this for Android / cross builds where llama.cpp is compiled
    //   by the platform toolchain.
    //
    // Mode B, **CMake** (default): build llama.cpp from `LLAMA_CPP_DIR`,
    //   or `third_party/llama.cpp` when unset.
    //
    // With the `backend-dl` feature, ggml compute backends are built as
    // loadable modules and picked up at runtime from the plugin
    // directory passed to `ggml_backend_load_all_from_path`.

    let (lib_dir, include_dir) = if let Ok(prebuilt) = env::var("LLAMA_PREBUILT_DIR") {
        let prebuilt = PathBuf::from(&prebuilt);
        assert!(
            prebuilt.exists(),
            "LLAMA_PREBUILT_DIR={} does not exist",
            prebuilt.display()
        );
        println!(
            "cargo:warning=Using prebuilt llama.cpp from {}",
            prebuilt.display()
        );
        (lib_dir_of(&prebuilt), prebuilt.join("include"))
    } else {
        assert!(
            llama_cpp_dir.join("CMakeLists.txt").exists(),
            "llama.cpp source not found at {}. \
             Run `git submodule update --init --recursive` or set LLAMA_CPP_DIR.",
            llama_cpp_dir.display()
        );

        let mut cfg = cmake::Config::new(&llama_cpp_dir);
        cfg.define("BUILD_SHARED_LIBS", if backend_dl { "ON" } else { "OFF" })
            .define("LLAMA_BUILD_SERVER", "OFF")
            .define("LLAMA_BUILD_TESTS", "OFF")
            .define("LLAMA_BUILD_EXAMPLES", "OFF")
            .define("LLAMA_BUILD_TOOLS", "OFF")
            .define("LLAMA_BUILD_COMMON", "OFF")
            .define("LLAMA_CURL", "OFF");

        if backend_dl {
            cfg.define("GGML_BACKEND_DL", "ON")
                .define("GGML_CPU_ALL_VARIANTS", "ON")
                .define("GGML_NATIVE", "OFF");
        }

        // GPU backend selection
        if env::var("CARGO_FEATURE_CUDA").is_ok() {
            cfg.define("GGML_CUDA", "ON");
        }
        if env::var("CARGO_FEATURE_VULKAN").is_ok() {
            cfg.define("GGML_VULKAN", "ON");
        }
        if env::var("CARGO_FEATURE_ROCM").is_ok() {
            let rocm = env::var("ROCM_PATH").unwrap_or_else(|_| "/opt/rocm".into());
            cfg.define("GGML_HIP", "ON")
                .define("CMAKE_HIP_COMPILER_ROCM_ROOT", &rocm)
                .define("CMAKE_HIP_FLAGS", format!("--rocm-path={rocm}"));
            if let Ok(targets) = env::var("AMDGPU_TARGETS") {
                cfg.define("AMDGPU_TARGETS", &targets);
            }
        }
        if target_os == "macos" {
            cfg.define("GGML_METAL", "ON");
        }
        if target_os == "android" {
            cfg.define("GGML_OPENMP", "OFF").define("GGML_LLAMAFILE", "OFF");
        }

        let dst = cfg.build();
        (lib_dir_of(&dst), dst.join("include"))
    };

    // ── Link libraries ────────────────────────────────────────────────
    println!("cargo:rustc-link-search=native={}", lib_dir.display());

    if backend_dl {
        // Backends are modules resolved at runtime; only the core
        // libraries are linked.
        for name in &["llama", "ggml", "ggml-base"] {
            println!("cargo:rustc-link-lib=dylib={name}");
        }
    } else {
        link_static(&lib_dir, &target_os);
    }

    // Platform system libraries
    match target_os.as_str() {
        "linux" => {
            println!("cargo:rustc-link-lib=stdc++");
            println!("cargo:rustc-link-lib=m");
            println!("cargo:rustc-link-lib=pthread");
            println!("cargo:rustc-link-lib=dl");
            if !backend_dl {
                println!("cargo:rustc-link-lib=gomp"); // OpenMP (used by ggml-cpu)
            }
        }
        "android" => {
            println!("cargo:rustc-link-lib=c++_shared");
            println!("cargo:rustc-link-lib=log");
            println!("cargo:rustc-link-lib=dl");
        }
        "macos" => {
            for fw in &["Accelerate", "Metal", "MetalKit", "Foundation"] {
                println!("cargo:rustc-link-lib=framework={fw}");
            }
            println!("cargo:rustc-link-lib=c++");
        }
        "windows" => {
            println!("cargo:rustc-link-lib=msvcrt");
        }
        _ => {}
    }

    // ── Generate Rust bindings ────────────────────────────────────────
    let mut builder = bindgen::Builder::default()
        .header("wrapper.h")
        .clang_arg(format!("-I{}", include_dir.display()));

    // ggml headers may live in the source tree rather than the install dir
    let ggml_include = llama_cpp_dir.join("ggml/include");
    if ggml_include.exists() {
        builder = builder.clang_arg(format!("-I{}", ggml_include.display()));
    }

    let bindings = builder
        .allowlist_function("llama_.*")
        .allowlist_function("ggml_backend_load_all.*")
        .allowlist_function("ggml_backend_reg_count")
        .allowlist_type("llama_.*")
        .allowlist_type("ggml_log_level")
        .allowlist_var("LLAMA_.*")
        .derive_default(true)
        .size_t_is_usize(true)
        .generate()
        .expect("Failed to generate bindings");

    let out = PathBuf::from(env::var("OUT_DIR").unwrap());
    bindings
        .write_to_file(out.join("bindings.rs"))
        .expect("Failed to write bindings");

    println!("cargo:rerun-if-changed=wrapper.h");
}

fn lib_dir_of(root: &Path) -> PathBuf {
    if root.join("lib64").exists() {
        root.join("lib64")
    } else {
        root.join("lib")
    }
}

fn link_static(lib_dir: &Path, target_os: &str) {
    println!("cargo:rustc-link-lib=static=llama");

    // ggml libraries that exist in this build
    for name in &["ggml", "ggml-base", "ggml-cpu"] {
        if lib_dir.join(format!("lib{name}.a")).exists() {
            println!("cargo:rustc-link-lib=static={name}");
        }
    }

    if env::var("CARGO_FEATURE_CUDA").is_ok() && lib_dir.join("libggml-cuda.a").exists() {
        println!("cargo:rustc-link-lib=static=ggml-cuda");
        for lib in &["cuda", "cublas", "culibos", "cudart"] {
            println!("cargo:rustc-link-lib={lib}");
        }
    }
    if env::var("CARGO_FEATURE_VULKAN").is_ok() && lib_dir.join("libggml-vulkan.a").exists() {
        println!("cargo:rustc-link-lib=static=ggml-vulkan");
        println!("cargo:rustc-link-lib=vulkan");
    }
    if env::var("CARGO_FEATURE_ROCM").is_ok() && lib_dir.join("libggml-hip.a").exists() {
        println!("cargo:rustc-link-lib=static=ggml-hip");
        let rocm = env::var("ROCM_PATH").unwrap_or_else(|_| "/opt/rocm".into());
        println!("cargo:rustc-link-search=native={rocm}/lib");
        for lib in &[
            "amdhip64",
            "hipblas",
            "hiprtc",
            "rocblas",
            "hsa-runtime64",
            "amd_comgr",
        ] {
            println!("cargo:rustc-link-lib={lib}");
        }
    }
    if target_os == "macos" && lib_dir.join("libggml-metal.a").exists() {
        println!("cargo:rustc-link-lib=static=ggml-metal");
    }
}
