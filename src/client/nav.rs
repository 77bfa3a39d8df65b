//! Navigation shell: the four top-level pages and the nav bar.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Blog,
    Reviews,
    Products,
}

impl Route {
    /// Nav bar order
    pub const ALL: [Route; 4] = [Route::Home, Route::Blog, Route::Reviews, Route::Products];

    pub fn path(self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Blog => "/blog",
            Route::Reviews => "/reviews",
            Route::Products => "/products",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Route::Home => "Home",
            Route::Blog => "Blog",
            Route::Reviews => "Reviews",
            Route::Products => "Products",
        }
    }

    /// Exact match only; no nested routes.
    pub fn from_path(path: &str) -> Option<Route> {
        Self::ALL.into_iter().find(|route| route.path() == path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    pub route: Route,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavBar {
    current: Route,
}

impl NavBar {
    /// Unknown locations highlight Home.
    pub fn at(location: &str) -> Self {
        Self {
            current: Route::from_path(location).unwrap_or(Route::Home),
        }
    }

    pub fn active(&self) -> Route {
        self.current
    }

    pub fn navigate(&mut self, route: Route) {
        self.current = route;
    }

    pub fn entries(&self) -> Vec<NavEntry> {
        Route::ALL
            .into_iter()
            .map(|route| NavEntry {
                route,
                active: route == self.current,
            })
            .collect()
    }
}
