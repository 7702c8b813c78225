/*!
# Values and Expressions

## Data types

| Suffix | `AS` name | Size | Range |
|--------|-----------|------|-------|
| `%` or none | `INTEGER` | 2 bytes | -32768 to 32767 |
| `&` | `LONG` | 4 bytes | -2147483648 to 2147483647 |
| `!` | `DECIMAL` | 6 bytes | 10 digits, up to 7 behind the point |
| `$` | `STRING` | 2 byte pointer | up to 255 characters |

A variable without a suffix is an integer unless `DIM` gives it another
type.

```text
10 DIM PRICE AS DECIMAL, NAME AS STRING
20 PRICE = 19.99
30 NAME = "APPLE"
```

Decimal values are packed BCD. Byte 0 holds the sign in bit 7 and the
number of digits behind the point in the low bits. There is no binary
floating point, 0.1 is exactly 0.1.

## Literals

```text
42        integer
&H7FFF    hexadecimal integer
100000    long, too big for an integer
3.25      decimal
"TEXT"    string
```

A decimal literal with more than 10 digits is cut and warned about.

## Operators

From highest to lowest precedence:

1. unary `-`, `NOT`
2. `*`, `/`, `MOD`
3. `+`, `-`
4. `SHL`, `SHR`
5. `=`, `<>`, `<`, `<=`, `>`, `>=`
6. `AND`
7. `OR`, `XOR`

`SHL` and `SHR` shift an integer left or right by the given number of
bits, filling with zeros. Shifting by 16 or more gives 0.

Mixed operands are widened from integer to long to decimal. `+` on two
strings concatenates them. Comparisons give -1 for true and 0 for false.

Expressions made only of constants are computed by the compiler. A
division by zero or an overflow in such an expression is a compile error.
`CINT` and `CLNG` of a constant round half to even.

## Built-in functions

| Function | Result |
|----------|--------|
| `ABS(x)`, `SGN(x)` | absolute value, sign |
| `CINT(x)`, `CLNG(x)`, `CDEC(x)` | conversion |
| `ROUND(x[,m])` | decimal rounding; mode 0 half down, 1 half even (default), 2 half up |
| `TRUNC(x)`, `FRAC(x)` | integer and fractional part of a decimal |
| `MAX(a,b)`, `MIN(a,b)` | larger, smaller value |
| `LEN(s$)`, `ASC(s$)`, `VAL(s$)` | length, first code, numeric value |
| `CHR$(n)`, `STR$(x)`, `SPACE$(n)` | string builders |
| `LEFT$(s$,n)`, `RIGHT$(s$,n)`, `MID$(s$,p[,n])` | substrings |
| `INKEY$` | key pressed right now or empty string |
| `PEEK(a)`, `INP(p)` | memory byte, I/O port byte |
| `DEEK(a)` | memory word, low byte first |
| `INSTR([p,]s$,f$)` | position of `f$` in `s$` from `p` on, 0 if not found |
| `UPPER$(s$)`, `LOWER$(s$)` | letters converted; `UCASE$` and `LCASE$` also work |
| `LTRIM$(s$)`, `RTRIM$(s$)`, `TRIM$(s$)` | spaces and control codes removed |
| `MIRROR$(s$)` | characters in reverse order |
| `HEX$(n[,w])`, `BIN$(n[,w])` | hexadecimal and binary digits, `w` of them if given |
| `STRING$(n,c)` | `n` copies of a character code or a string |
| `RND(n)` | random integer from 1 to `n` |
| `SQR(n)` | integer square root |

Names of built-in functions are reserved and can't be used for SUB or
FUNCTION names.

## Strings

Strings live on a heap between `HEAPB` and `HEAPE` whose size is set with
`heap_size`. Every heap block carries a reference count. Values that are
no longer referenced are given back at once. Temporaries the compiler
can't follow are marked and swept when the heap runs out.
*/
