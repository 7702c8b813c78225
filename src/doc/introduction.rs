/*!
# Introduction

`basic-z80` reads BASIC source files and writes one Z80 assembler file for
each of them. Nothing is executed. Assemble the output with any assembler
that understands `ORG`, `DB`, `DW`, `DS` and `EQU`, then load the binary on
the machine or an emulator.

```text
basic-z80 hello.bas                  writes hello.asm
basic-z80 -o game.asm game.bas       explicit output name
basic-z80 --target z9001 *.bas       several files, one target
basic-z80 -O heap_size=4096 big.bas  any option by name
```

A first program:

```text
10 PRINT "HELLO WORLD"
```

compiles to a startup block at `MSTART`, the program body behind label `L10`,
the print routine `XOUTST` and the program exit `XEXIT`. The file ends with
the label `M_TOP`, the first free byte above the program.

## Source lines

Every line may start with a line number. Numbers are optional, GOTO targets
can also be named labels written as `NAME:` in front of a statement.
Several statements on one line are separated by `:`. Upper and lower case
are the same outside of string literals.

```text
10 INPUT "HOW MANY"; N
20 FOR I = 1 TO N: PRINT I: NEXT
   AGAIN: PRINT "DONE"
```

## Errors

All errors of a file are reported, each with the file, the physical line,
the BASIC line number when there is one and the statement text with a
` ??? ` marker at the place of the error. No assembler file is written
when there were errors. After 50 errors the compiler gives up.

```text
game.bas:3: SYNTAX ERROR IN 30 (6..7)
PRINT 1+ ???
```

Warnings never stop compilation. They point at implicitly declared
variables, variables that are written but never read and line numbers that
are not ascending.

## Logging

`-v` prints the files written, `-vv` adds compiler phases. The `RUST_LOG`
environment variable overrides both.
*/
