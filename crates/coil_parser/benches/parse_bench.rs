use coil_diagnostics::DiagnosticCollection;
use coil_lexer::Lexer;
use coil_parser::Parser;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

// A medium-size coil source (~80 lines) with various constructs
const COIL_SOURCE: &str = r#"
"""User registry with lookup and filtering helpers."""

from __future__ import division

import math

DEFAULT_THEME = 'light'
_next_id = 1


class ValidationError(Exception):
    pass


class User(object):
    def __init__(self, name, email, age=None):
        global _next_id
        self.id = _next_id
        _next_id += 1
        self.name = name
        self.email = email
        self.age = age
        self.__preferences = {'theme': DEFAULT_THEME, 'notifications': True}

    def set_preference(self, key, value):
        if key not in self.__preferences:
            raise ValidationError('unknown preference: %s' % key)
        self.__preferences[key] = value

    def is_adult(self):
        return self.age is not None and self.age >= 18


class UserService(object):
    def __init__(self):
        self.users = {}

    def create_user(self, name, email, **extra):
        user = User(name, email, *extra.get('args', ()))
        self.users[user.id] = user
        return user

    def get_user(self, user_id):
        try:
            return self.users[user_id]
        except KeyError:
            return None

    def delete_user(self, user_id):
        if user_id in self.users:
            del self.users[user_id]
            return True
        return False

    def iter_adults(self):
        for user in self.users.values():
            if user.is_adult():
                yield user


def filter_users(users, predicate=lambda u: True):
    return [u for u in users if predicate(u)]


def average_age(users):
    ages = [u.age for u in users if u.age is not None]
    if not ages:
        return 0
    return sum(ages) / len(ages)


def summarize(service):
    adults = list(u.name for u in service.iter_adults())
    buckets = {'adults': len(adults), 'total': len(service.users)}
    return adults, buckets, math.sqrt(len(adults) ** 2 + 1)
"#;

fn bench_parse_coil(c: &mut Criterion) {
    c.bench_function("parse_coil_medium", |b| {
        b.iter(|| {
            let mut sink = DiagnosticCollection::new();
            let lexer = Lexer::new(black_box(COIL_SOURCE), "bench.coil");
            let module = Parser::new(lexer, &mut sink).parse_module();
            black_box(module).unwrap();
        });
    });
}

criterion_group!(benches, bench_parse_coil);
criterion_main!(benches);
