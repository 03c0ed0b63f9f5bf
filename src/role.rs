// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use crate::{config::RoleLookup, navigation::Route};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Role {
    Admin,
    Employee,
    Student,
    Guest,
}

/// Most privileged first.
const PRIORITY: [Role; 4] = [Role::Admin, Role::Employee, Role::Student, Role::Guest];

/// Where each role sits in the authority list of tokens from older servers,
/// in the order those positions are tried.
const POSITIONS: [(usize, Role); 4] = [
    (1, Role::Student),
    (2, Role::Employee),
    (2, Role::Admin),
    (1, Role::Guest),
];

impl Role {
    pub(crate) const fn authority(self) -> &'static str {
        match self {
            Self::Admin => "ROLE_ROLE_ADMIN",
            Self::Employee => "ROLE_ROLE_EMPLOYEE",
            Self::Student => "ROLE_ROLE_STUDENT",
            Self::Guest => "ROLE_ROLE_GUEST",
        }
    }

    pub(crate) fn from_authority(authority: &str) -> Option<Self> {
        PRIORITY.into_iter().find(|role| role.authority() == authority)
    }

    pub(crate) const fn landing(self) -> Route {
        match self {
            Self::Admin => Route::AdminOffense,
            Self::Employee => Route::EmployeeCaseList,
            Self::Student => Route::StudentViolation,
            Self::Guest => Route::GuestViolation,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.authority())
    }
}

/// A role picked out of a token, and whether the user's identifier should be
/// stored alongside it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Resolution {
    pub(crate) role: Role,
    pub(crate) keeps_user_id: bool,
}

pub(crate) fn resolve(lookup: RoleLookup, authorities: &[String]) -> Option<Resolution> {
    match lookup {
        RoleLookup::Priority => PRIORITY
            .into_iter()
            .find(|role| authorities.iter().any(|a| a == role.authority()))
            .map(|role| Resolution {
                role,
                keeps_user_id: true,
            }),
        RoleLookup::Positional => POSITIONS
            .into_iter()
            .find(|(index, role)| {
                authorities
                    .get(*index)
                    .map_or(false, |a| a == role.authority())
            })
            .map(|(_, role)| Resolution {
                role,
                // Older servers omit the identifier from administrator logins.
                keeps_user_id: role != Role::Admin,
            }),
    }
}
