// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use log::info;

/// Destinations owned by the surrounding application.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Route {
    AccountOtp,
    Login,
    StudentViolation,
    EmployeeCaseList,
    AdminOffense,
    GuestViolation,
}

impl Route {
    pub(crate) const fn path(self) -> &'static str {
        match self {
            Self::AccountOtp => "/account/otp",
            Self::Login => "/login",
            Self::StudentViolation => "/student/violation",
            Self::EmployeeCaseList => "/employee/cs-list",
            Self::AdminOffense => "/admin/offense",
            Self::GuestViolation => "/guest/violation",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

pub(crate) trait Navigator: Send + Sync {
    fn navigate(&mut self, route: Route);
}

impl<T: Navigator + ?Sized> Navigator for Box<T> {
    fn navigate(&mut self, route: Route) {
        (**self).navigate(route);
    }
}

/// Reports the destination on standard output, where a launcher or shell
/// script can pick it up.
pub(crate) struct Terminal;

impl Navigator for Terminal {
    fn navigate(&mut self, route: Route) {
        info!("Navigating to {route}");
        println!("{route}");
    }
}
