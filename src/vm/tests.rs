//! End-to-end pipeline scenarios (spec §8) and VM-level fault behavior,
//! driven through the full tokenize → parse → lower → emit → run pipeline
//! via [`crate::compile_and_run`] against a [`crate::host::BufferHost`] so
//! assertions can inspect captured `PRINT` lines instead of real stdout.

use super::*;
use crate::compile_and_run;
use crate::host::BufferHost;

fn run_source(src: &str) -> Vec<String> {
    let mut host = BufferHost::default();
    compile_and_run(src, &mut host).expect("program should run to completion");
    host.output
}

#[test]
fn scenario_1_arithmetic_precedence() {
    let out = run_source("LET X = 2 + 3 * 4\nPRINT X\n");
    assert_eq!(out, vec!["14"]);
}

#[test]
fn scenario_2_while_loop_counts_up() {
    let src = "LET I = 0\nWHILE I < 3\nPRINT I\nLET I = I + 1\nWEND\n";
    assert_eq!(run_source(src), vec!["0", "1", "2"]);
}

#[test]
fn scenario_3_for_loop_counts_up() {
    let src = "FOR I = 1 TO 3\nPRINT I\nNEXT I\n";
    assert_eq!(run_source(src), vec!["1", "2", "3"]);
}

#[test]
fn scenario_4_array_sum() {
    let src = "\
LET A = ARRAY(3)
LET A[0] = 10
LET A[1] = 20
LET A[2] = 30
LET S = 0
LET I = 0
WHILE I < 3
LET S = S + A[I]
LET I = I + 1
WEND
PRINT S
";
    assert_eq!(run_source(src), vec!["60"]);
}

#[test]
fn scenario_5_if_then_else() {
    let src = "LET X = 5\nIF X > 3 THEN\nPRINT \"big\"\nELSE\nPRINT \"small\"\nEND IF\n";
    assert_eq!(run_source(src), vec!["big"]);
}

#[test]
fn scenario_6_repeat_until_truthy_exits_after_one_iteration() {
    let src = "REPEAT\nPRINT \"x\"\nLET Z = 1\nUNTIL Z\n";
    assert_eq!(run_source(src), vec!["x"]);
}

#[test]
fn input_prints_a_prompt_then_parses_or_falls_back_to_a_string() {
    let src = "INPUT X\nPRINT X\nINPUT Y\nPRINT Y\n";
    let mut host = BufferHost::with_input(&["42", "hello"]);
    compile_and_run(src, &mut host).expect("program should run to completion");
    assert_eq!(host.output, vec!["? ", "42", "? ", "hello"]);
}

#[test]
fn relational_operators_cover_all_four() {
    let src = "\
IF 1 < 2 THEN
PRINT \"lt\"
END IF
IF 2 <= 2 THEN
PRINT \"le\"
END IF
IF 3 > 2 THEN
PRINT \"gt\"
END IF
IF 2 >= 2 THEN
PRINT \"ge\"
END IF
";
    assert_eq!(run_source(src), vec!["lt", "le", "gt", "ge"]);
}

#[test]
fn binary_op_on_short_stack_is_a_stack_fault() {
    // ADD with an empty stack.
    let code = vec![op::ADD, op::HALT];
    let mut host = BufferHost::default();
    let err = run(&code, &mut host, &VmConfig::default()).unwrap_err();
    assert!(matches!(err, Fault::Stack { .. }));
}

#[test]
fn operand_running_past_bytecode_end_is_a_memory_fault() {
    // PUSH with no int32 operand bytes at all.
    let code = vec![op::PUSH];
    let mut host = BufferHost::default();
    let err = run(&code, &mut host, &VmConfig::default()).unwrap_err();
    assert!(matches!(err, Fault::Memory { .. }));
}

#[test]
fn mixed_type_arithmetic_is_a_type_fault() {
    let src = "PRINT 1 + \"a\"\n";
    let mut host = BufferHost::default();
    let err = compile_and_run(src, &mut host).unwrap_err();
    assert!(matches!(err, Fault::Type { .. }));
}

#[test]
fn division_by_zero_is_an_arithmetic_fault() {
    let src = "PRINT 1 / 0\n";
    let mut host = BufferHost::default();
    let err = compile_and_run(src, &mut host).unwrap_err();
    assert!(matches!(err, Fault::DivideByZero { .. }));
}

#[test]
fn array_out_of_bounds_is_a_memory_fault() {
    let src = "LET A = ARRAY(2)\nPRINT A[5]\n";
    let mut host = BufferHost::default();
    let err = compile_and_run(src, &mut host).unwrap_err();
    assert!(matches!(err, Fault::Memory { .. }));
}

#[test]
fn arrays_are_shared_by_reference() {
    // Assigning through one variable's array must be visible through a second
    // LET-bound alias to the same array value (spec §3: "Arrays are shared by
    // reference; copying a value copies the reference, not the elements.").
    let src = "\
LET A = ARRAY(1)
LET B = A
LET A[0] = 9
PRINT B[0]
";
    assert_eq!(run_source(src), vec!["9"]);
}

#[test]
fn call_with_no_caller_frame_is_a_fault() {
    let code = vec![op::RET];
    let mut host = BufferHost::default();
    let err = run(&code, &mut host, &VmConfig::default()).unwrap_err();
    assert!(matches!(err, Fault::Stack { .. }));
}
