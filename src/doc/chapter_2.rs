/*!
# Statements and Structures

## Simple statements

```text
LET A = 1          LET is optional
PRINT A; B$, C     ; joins, , adds a space, a trailing separator keeps the line
? "SHORT"          same as PRINT
INPUT "NAME"; N$   repeats the prompt until a number parses for numeric targets
PRINT TAB(8); "X"  TAB(n) prints n spaces, also as a statement of its own
POKE a, v          OUT p, v
DOKE a, v          stores a word, low byte first
PAUSE [n]          n tenths of a second, without n wait for a key
CLS                LOCATE row, col
COLOR f[, b]       BORDER c         CURSOR n
END                STOP
REM text           ' text
```

`CLS`, `LOCATE`, `COLOR`, `BORDER` and `CURSOR` need a target that can do
them. Using one the target lacks is a compile error. There are no
graphics or file statements.

## Jumps

```text
GOTO 100           GOSUB 200        RETURN
GOTO DONE          jumps to a line labelled DONE:
ON K GOTO 10, 20, 30
ON K GOSUB 10, 20
```

Jump targets are checked after the whole source is read, so forward
references are fine.

## IF

```text
10 IF A < 0 THEN PRINT "NEG" ELSE PRINT "POS"
20 IF A THEN 100
30 IF A = 1 THEN
40   PRINT "ONE"
50 ELSEIF A = 2 THEN
60   PRINT "TWO"
70 ELSE
80   PRINT "MANY"
90 END IF
```

A condition that is a constant selects its branch at compile time. The
other branch produces no code at all but is still checked for errors.

## Loops

```text
DO [WHILE c | UNTIL c] ... LOOP [WHILE c | UNTIL c]
WHILE c ... WEND
FOR I = a TO b [STEP s] ... NEXT [I]
EXIT DO | EXIT FOR | EXIT WHILE
```

The FOR body runs at least once, the end test is done at `NEXT`. The
limit and step are evaluated once, when they are not constants they are
kept in hidden cells. A negative constant step counts down.

## SELECT CASE

```text
10 SELECT CASE K
20 CASE 1
30   PRINT "ONE"
40 CASE 2, 3
50   PRINT "SOME"
60 CASE 4 TO 9
70   PRINT "MORE"
80 CASE ELSE
90   PRINT "LOTS"
100 END SELECT
```

## Nesting errors

Closing a structure that is not the innermost open one gives an error like
`LOOP WITHOUT DO`. A structure still open at the end of the source gives
an error like `DO WITHOUT LOOP` at the line where it was opened.
*/
