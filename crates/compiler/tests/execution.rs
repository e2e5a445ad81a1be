//! End-to-end execution tests
//!
//! Each program from the behavioral corpus is compiled to a native
//! executable, run, and its stdout compared against the documented
//! output (with stdin supplied where the program reads). These tests
//! need a C compiler driver on PATH, the same as any use of the
//! compiler driver itself.

use std::fs;
use std::io::Write as _;
use std::path::Path;
use std::process::{Command, Stdio};

struct Program {
    name: &'static str,
    source: &'static str,
    stdin: Option<&'static str>,
    expected_stdout: &'static str,
}

const PROGRAMS: &[Program] = &[
    Program {
        name: "arithmetic",
        source: "print_int(1 + 2 * 3);",
        stdin: None,
        expected_stdout: "7",
    },
    Program {
        name: "read_square",
        source: "var x: Int = read_int(); print_int(x * x);",
        stdin: Some("5\n"),
        expected_stdout: "25",
    },
    Program {
        name: "counting_loop",
        source: "var i: Int = 0; while (i < 3) { print_int(i); i = i + 1; }",
        stdin: None,
        expected_stdout: "0\n1\n2",
    },
    Program {
        name: "branch",
        source: "if (true) then print_int(1) else print_int(2);",
        stdin: None,
        expected_stdout: "1",
    },
    Program {
        name: "functions",
        source: "fun sq(x: Int): Int { return x*x; } print_int(sq(3) + sq(4));",
        stdin: None,
        expected_stdout: "25",
    },
    Program {
        name: "break_out",
        source: "var i: Int = 0; while (true) { if (i == 3) { break; } print_int(i); i = i + 1; }",
        stdin: None,
        expected_stdout: "0\n1\n2",
    },
    Program {
        name: "logic",
        source: "print_bool(1 == 1 and not (2 < 1));",
        stdin: None,
        expected_stdout: "true",
    },
];

fn compile_and_run(dir: &Path, program: &Program) -> String {
    let source_path = dir.join(format!("{}.norn", program.name));
    fs::write(&source_path, program.source).expect("write source file");
    let binary_path = dir.join(format!("{}_out", program.name));
    nornc::compile_file(&source_path, &binary_path, false)
        .unwrap_or_else(|e| panic!("{}: compilation failed: {}", program.name, e));

    let mut command = Command::new(&binary_path);
    command.stdout(Stdio::piped()).stdin(match program.stdin {
        Some(_) => Stdio::piped(),
        None => Stdio::null(),
    });
    let mut child = command.spawn().expect("spawn compiled program");
    if let Some(input) = program.stdin {
        child
            .stdin
            .take()
            .expect("stdin handle")
            .write_all(input.as_bytes())
            .expect("write stdin");
    }
    let output = child.wait_with_output().expect("wait for compiled program");
    assert!(
        output.status.success(),
        "{}: exited with {:?}",
        program.name,
        output.status.code()
    );
    String::from_utf8(output.stdout).expect("stdout is UTF-8")
}

// One test, sequential: compile_file extracts the runtime archive to a
// fixed temp path, so concurrent compilations would race on it.
#[test]
fn test_programs_run_with_expected_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    for program in PROGRAMS {
        let stdout = compile_and_run(dir.path(), program);
        assert_eq!(
            stdout.trim_end_matches('\n'),
            program.expected_stdout,
            "program {}",
            program.name
        );
    }
}
