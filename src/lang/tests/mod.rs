mod lex_test;
