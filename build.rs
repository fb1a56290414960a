use std::env;

fn main() {
    println!("cargo:rerun-if-changed=kernels");
    println!("cargo:rerun-if-env-changed=ROCM_PATH");
    println!("cargo:rerun-if-env-changed=HIPCC");
    println!("cargo:rerun-if-env-changed=ROCM_ARCH");

    // HIP linking and kernel compilation only happen for the rocm feature;
    // the host-only build must not require a ROCm install.
    if env::var_os("CARGO_FEATURE_ROCM").is_none() {
        return;
    }

    let rocm_root = env::var("ROCM_PATH").unwrap_or_else(|_| "/opt/rocm".to_string());
    println!("cargo:rustc-link-search=native={}/lib", rocm_root);
    println!("cargo:rustc-link-lib=dylib=amdhip64");

    compile_hip_kernels(&rocm_root);
}

fn compile_hip_kernels(rocm_root: &str) {
    use std::path::{Path, PathBuf};
    use std::process::Command;

    let hipcc = env::var("HIPCC").unwrap_or_else(|_| format!("{}/bin/hipcc", rocm_root));
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    if !Path::new(&hipcc).exists() {
        println!(
            "cargo:warning=hipcc not found at {}. Skipping kernel compilation.",
            hipcc
        );
        return;
    }

    let target_arch = env::var("ROCM_ARCH").unwrap_or_else(|_| "gfx1100".to_string());

    // Kernels to compile: (source_file, env_var_name, kernel_name)
    let kernels = [("kernels/split.hip", "SPLIT_HSACO", "split_copy_kernel")];

    for (src_file, env_name, kernel_name) in &kernels {
        let src_path = PathBuf::from(src_file);

        if !src_path.exists() {
            println!("cargo:warning=Kernel source not found: {}", src_file);
            continue;
        }

        let hsaco_path = out_dir.join(format!("{}.hsaco", kernel_name));

        let status = Command::new(&hipcc)
            .arg("-c")
            .arg("--genco")
            .arg(format!("--offload-arch={}", target_arch))
            .arg("-O3")
            .arg(src_file)
            .arg("-o")
            .arg(&hsaco_path)
            .status();

        match status {
            Ok(status_code) if status_code.success() => {
                println!("cargo:rustc-env={}={}", env_name, hsaco_path.display());
                println!("Compiled {} -> {}", src_file, hsaco_path.display());
            }
            Ok(status_code) => {
                println!(
                    "cargo:warning=Failed to compile {}: exit code {:?}",
                    src_file,
                    status_code.code()
                );
            }
            Err(e) => {
                println!(
                    "cargo:warning=Failed to execute hipcc for {}: {:?}",
                    src_file, e
                );
            }
        }
    }
}
