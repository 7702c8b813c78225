/*!
# Procedures, Arrays and Data

## SUB and FUNCTION

```text
10 DECLARE FUNCTION TWICE%(N%)
20 PRINT TWICE%(21)
30 SHOW "HI"
40 END
50 SUB SHOW(T$)
60   LOCAL K
70   FOR K = 1 TO 3: PRINT T$: NEXT
80 END SUB
90 FUNCTION TWICE%(N%)
100  TWICE% = N% * 2
110 END FUNCTION
```

Arguments are passed by value and pushed on the stack. Strings are copied
so the procedure owns its argument. `LOCAL` variables live in the stack
frame addressed through `IY`. String locals start empty and are freed when
the procedure returns. A procedure can use global variables but can't
declare new ones implicitly.

A FUNCTION used before its definition needs a `DECLARE`. A SUB called
with `CALL` is found even when it is defined further down. `EXIT SUB` and
`EXIT FUNCTION` leave early. Procedures can't be nested and can't be
defined inside a loop or IF.

## Arrays

```text
10 DIM A(5, 3), N$(10)
20 A(2, 1) = 7
30 N$(I) = "X"
```

Arrays have one or two dimensions starting at index 0. `DIM A(5)` has six
elements. Arrays must be declared and the sizes must be constants.
Constant indices are checked and resolved by the compiler. Other indices
are checked at runtime unless `check_bounds` is off.

## DATA, READ and RESTORE

```text
10 DATA 1, 300, "AB", -1
20 READ A%, B%, C$, D%
30 RESTORE 10
```

DATA holds integer and string constants. `RESTORE n` continues reading at
the DATA of line n, `RESTORE` alone starts over.

## INCLUDE

```text
10 INCLUDE "LIB.BAS"
```

`INCLUDE` must be alone on its line. The file is looked up next to the
main source. An included file can't include another one.
*/
