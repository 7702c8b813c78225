/*!
# Appendix A: Targets, Options and Errors

## Targets

| Name | Start | System calls | Screen control |
|------|-------|--------------|----------------|
| `z1013` | 0100H | RST 20H monitor | CLS, LOCATE, CURSOR |
| `z9001`, `kc87` | 0300H | BOS at 0005H | all |
| `kc85`, `kc85/2`, `kc85/3` | 0300H | CAOS at 0F003H | all |

Z9001 programs start with a `JP MSTART` and the program name so the OS
lists them. KC 85 programs carry a CAOS menu entry.

## Options

Set with `-O name=value` or the matching flag.

| Name | Default | Flag |
|------|---------|------|
| `target` | z1013 | `--target` |
| `app_name` | file name | |
| `begin_addr` | target start | `--org` |
| `stack_size` | 128 | `--stack` |
| `heap_size` | 1024 | `--heap` |
| `check_bounds` | true | `--no-bounds-check` |
| `check_stack` | true | `--no-stack-check` |
| `optimize` | true | `--no-optimize` |
| `trace_line_numbers` | false | `--trace-lines` |
| `break_check` | input | never, input, always |
| `warn_implicit` | true | |
| `warn_unused` | true | |
| `implicit_declaration` | true | |
| `prefer_relative_jumps` | true | |
| `include_source` | false | |
| `header` | true | |

## Error messages

| Message | Cause |
|---------|-------|
| SYNTAX ERROR | statement can't be parsed |
| TYPE MISMATCH | string where a number belongs or the other way |
| OVERFLOW | constant out of range |
| OUT OF MEMORY | too many locals for one stack frame |
| UNDEFINED LINE | jump to a line or label that does not exist |
| DUPLICATE LINE | same line number twice |
| SUBSCRIPT OUT OF RANGE | constant index outside the array |
| DUPLICATE DEFINITION | name declared twice |
| DIVISION BY ZERO | constant division by zero |
| STRING TOO LONG | literal longer than 255 characters |
| UNDEFINED FUNCTION | called procedure never implemented |
| UNDECLARED VARIABLE | implicit declaration switched off or not allowed |
| RESERVED WORD | keyword or built-in used as a name |
| SIGNATURE MISMATCH | declaration and definition differ |
| NESTED SUB OR FUNCTION | procedure inside a procedure or structure |
| EXIT WITHOUT LOOP | EXIT outside of the matching structure |
| x WITHOUT y | structure closed or left open |
| FILE NOT FOUND | INCLUDE or source file missing |
| NESTED INCLUDE | INCLUDE inside an included file |
| NOT SUPPORTED BY TARGET | statement needs hardware the target lacks |
| TOO MANY ERRORS | more than 50 errors |
*/
